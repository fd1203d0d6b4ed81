use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use tracing::{info, warn};

use mindbridge_api::client::ApiClient;
use mindbridge_api::{auth, catalog, children as children_api};
use mindbridge_bot::children;
use mindbridge_bot::flow::BotSession;
use mindbridge_bot::questionnaires;
use mindbridge_bot::review::ReviewTable;
use mindbridge_bot::store::Store;
use mindbridge_core::models::child::Child;
use mindbridge_core::models::session::Guardian;
use mindbridge_core::models::user::{LoginRequest, Role, User};
use mindbridge_core::validation::{ChildForm, SignupForm, StartForm};

use crate::cli::{
    AddChildArgs, ChildrenCommand, Cli, Command, ConfigCommand, ReviewsCommand, SignupArgs,
    TakeArgs,
};
use crate::config::{self, API_URL_ENV, MindbridgeConfig};
use crate::interactive;

/// Everything a command needs: where state lives, the loaded config, a
/// client pointed at the resolved backend, and the restored login.
pub struct Context {
    pub dir: PathBuf,
    pub config: MindbridgeConfig,
    pub client: ApiClient,
    pub store: Store,
}

impl Context {
    pub fn load(dir: PathBuf, api_url: Option<&str>) -> Result<Self> {
        let config = config::load_or_default(&dir)?;
        let env_url = std::env::var(API_URL_ENV).ok();
        let base_url = config::resolve_base_url(api_url, env_url.as_deref(), &config);
        let mut client = ApiClient::new(&base_url, config.request_timeout())?;

        let mut store = Store::new();
        if let Some(credentials) = config::load_auth(&dir)? {
            if credentials.is_expired(jiff::Timestamp::now()) {
                warn!("stored login has expired; sign in again");
            } else {
                client.set_token(Some(credentials.token.clone()));
                store.auth.sign_in(credentials);
            }
        }

        Ok(Self {
            dir,
            config,
            client,
            store,
        })
    }

    fn user(&self) -> Result<User> {
        self.store
            .auth
            .user(jiff::Timestamp::now())
            .cloned()
            .ok_or_else(|| eyre::eyre!("not signed in; run `mindbridge login` first"))
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let dir = config::config_dir()?;
    // Config commands must work even when the stored URL is broken.
    let command = match cli.command {
        Command::Config(command) => return run_config(&dir, command),
        command => command,
    };
    let mut ctx = Context::load(dir, cli.api_url.as_deref())?;

    match command {
        Command::Login { mobile, password } => login(&mut ctx, mobile, password).await,
        Command::Logout => logout(&mut ctx).await,
        Command::Signup(args) => signup(&ctx, args).await,
        Command::SendOtp { mobile } => {
            let reply = auth::send_otp(&ctx.client, &mobile).await?;
            println!("{}", reply.message);
            Ok(())
        }
        Command::VerifyOtp { mobile, otp } => {
            let reply = auth::verify_otp(&ctx.client, &mobile, &otp).await?;
            println!("{}", reply.message);
            Ok(())
        }
        Command::ChangePassword {
            mobile,
            otp,
            password,
        } => {
            auth::verify_otp(&ctx.client, &mobile, &otp).await?;
            let reply = auth::change_password(&ctx.client, &LoginRequest { mobile, password })
                .await?;
            println!("{}", reply.message);
            Ok(())
        }
        Command::Profile => {
            let user = auth::profile(&ctx.client).await?;
            print_user(&user);
            Ok(())
        }
        Command::RefreshToken => refresh_login(&mut ctx).await,
        Command::Ping => {
            let pong = catalog::ping(&ctx.client).await?;
            println!("{} is {}: {}", ctx.client.base_url(), pong.status, pong.message);
            Ok(())
        }
        Command::Questionnaires => list_questionnaires(&mut ctx).await,
        Command::Questionnaire { name } => show_questionnaire(&ctx, &name).await,
        Command::Models => {
            for model in catalog::models_or_fallback(&ctx.client).await {
                let marker = if model == ctx.config.default_model { "*" } else { " " };
                println!("{marker} {model}");
            }
            Ok(())
        }
        Command::SetQuestionnaireType { name, audience } => {
            let reply = catalog::set_questionnaire_type(&ctx.client, &name, audience.into()).await?;
            println!("{}", reply.message);
            Ok(())
        }
        Command::Children(command) => run_children(&mut ctx, command).await,
        Command::Take(args) => take(&mut ctx, args).await,
        Command::Resume {
            session_id,
            student,
            model,
            age,
        } => {
            let model = model.unwrap_or_else(|| ctx.config.default_model.clone());
            let mut session =
                BotSession::resume(&ctx.client, session_id, &student).with_model(model);
            if let Some(age) = age {
                session = session.with_age(age);
            }
            interactive::drive(&mut session).await
        }
        Command::Reviews(command) => run_reviews(&ctx, command).await,
        Command::Config(command) => run_config(&ctx.dir, command),
    }
}

async fn login(ctx: &mut Context, mobile: String, password: String) -> Result<()> {
    let response = auth::login(&ctx.client, &LoginRequest { mobile, password })
        .await
        .map_err(|e| eyre::eyre!("login failed: {}", e.user_message()))?;
    let credentials = response.into_credentials(jiff::Timestamp::now());
    config::save_auth(&ctx.dir, &credentials)?;

    println!(
        "Signed in as {} ({})",
        credentials.user.name, credentials.user.role
    );
    ctx.store.auth.sign_in(credentials);
    Ok(())
}

async fn refresh_login(ctx: &mut Context) -> Result<()> {
    let user = ctx.user()?;
    let refreshed = auth::refresh_token(&ctx.client)
        .await
        .map_err(|e| eyre::eyre!("token refresh failed: {}", e.user_message()))?;
    let credentials = refreshed.into_credentials(user, jiff::Timestamp::now());
    config::save_auth(&ctx.dir, &credentials)?;

    match credentials.expires_at {
        Some(at) => println!("Token refreshed; valid until {at}"),
        None => println!("Token refreshed"),
    }
    ctx.client.set_token(Some(credentials.token.clone()));
    ctx.store.auth.sign_in(credentials);
    Ok(())
}

async fn logout(ctx: &mut Context) -> Result<()> {
    if ctx.client.token().is_some()
        && let Err(e) = auth::logout(&ctx.client).await
    {
        warn!(error = %e, "server logout failed; clearing local login anyway");
    }
    config::delete_auth(&ctx.dir)?;
    ctx.store.logout();
    ctx.client.set_token(None);
    println!("Signed out");
    Ok(())
}

async fn signup(ctx: &Context, args: SignupArgs) -> Result<()> {
    let form = SignupForm {
        role: Some(args.role),
        name: args.name,
        school: args.school,
        mobile: args.mobile,
        confirm_password: args
            .confirm_password
            .unwrap_or_else(|| args.password.clone()),
        password: args.password,
        otp: args.otp,
    };
    let request = form.validate()?;
    let reply = auth::signup(&ctx.client, &request).await?;
    println!("{}", reply.message);
    Ok(())
}

async fn list_questionnaires(ctx: &mut Context) -> Result<()> {
    let listed = questionnaires::refresh(&ctx.client, &mut ctx.store).await?;
    if listed.is_empty() {
        println!("No questionnaires available");
    }
    for q in listed {
        match &q.description {
            Some(description) => println!("{}  - {description}", q.name),
            None => println!("{}", q.name),
        }
    }
    Ok(())
}

async fn show_questionnaire(ctx: &Context, name: &str) -> Result<()> {
    let questionnaire = catalog::get_questionnaire(&ctx.client, name).await?;
    println!("{}", questionnaire.name);
    if !questionnaire.instructions.is_empty() {
        println!("{}", questionnaire.instructions);
    }

    let (regular, follow_up) = questionnaire.partition();
    for (title, questions) in [("Questions", regular), ("Follow-up questions", follow_up)] {
        if questions.is_empty() {
            continue;
        }
        println!("\n{title} ({})", questions.len());
        for (i, question) in questions.iter().enumerate() {
            println!("{:>3}. {}", i + 1, question.text);
            if !question.options.is_empty() {
                println!("     [{}]", question.options.join(" | "));
            }
        }
    }
    Ok(())
}

async fn run_children(ctx: &mut Context, command: ChildrenCommand) -> Result<()> {
    match command {
        ChildrenCommand::List => {
            let listed = children::refresh(&ctx.client, &mut ctx.store).await?;
            print_children(listed);
        }
        ChildrenCommand::Add(args) => {
            let child = children::add(&ctx.client, &mut ctx.store, &child_form(args)).await?;
            println!("Added {} ({})", child.name, child.id);
        }
        ChildrenCommand::Delete { child_id } => {
            children::delete(&ctx.client, &mut ctx.store, &child_id).await?;
            println!("Deleted {child_id}");
        }
        ChildrenCommand::BySchool { school } => {
            let role = ctx.user()?.role;
            let listed = children_api::children_by_school(&ctx.client, role, &school).await?;
            print_children(&listed);
        }
    }
    Ok(())
}

fn child_form(args: AddChildArgs) -> ChildForm {
    ChildForm {
        name: args.name,
        dob: args.dob,
        gender: args.gender,
        school: args.school,
        parent_name: args.parent_name,
        parent_mobile: args.parent_mobile,
        teacher_name: None,
        teacher_mobile: None,
    }
}

async fn take(ctx: &mut Context, args: TakeArgs) -> Result<()> {
    let user = ctx.user()?;
    children::refresh(&ctx.client, &mut ctx.store).await?;
    if !ctx.store.children.select(&args.child_id) {
        return Err(eyre::eyre!("no child with id {}", args.child_id));
    }
    let child = ctx
        .store
        .children
        .selected()
        .cloned()
        .ok_or_else(|| eyre::eyre!("no child selected"))?;

    questionnaires::refresh(&ctx.client, &mut ctx.store).await?;
    let questionnaire = questionnaires::choose(&ctx.store, &args.questionnaire)?.name.clone();

    let form = start_form(&child, &user, &questionnaire, args.accept_terms);
    let model = args
        .model
        .unwrap_or_else(|| ctx.config.default_model.clone());
    let mut session = BotSession::new(&ctx.client).with_model(model);

    info!(child_id = %child.id, questionnaire = %args.questionnaire, "starting session");
    let started = session.start(&form).await;
    interactive::render_new(session.transcript(), 0);
    started.wrap_err("could not start the questionnaire")?;

    ctx.store.questionnaire.session_id = session.session_id().map(str::to_string);
    let shown = session.transcript().len();
    interactive::drive_from(&mut session, shown).await
}

fn start_form(child: &Child, user: &User, questionnaire: &str, accepted: bool) -> StartForm {
    let (guardian, guardian_mobile) = match user.role {
        Role::Teacher => (Guardian::Teacher(user.name.clone()), user.mobile.clone()),
        Role::Parent | Role::Psychologist => {
            let name = if child.parent_name.trim().is_empty() {
                user.name.clone()
            } else {
                child.parent_name.clone()
            };
            let mobile = if child.parent_mobile.trim().is_empty() {
                user.mobile.clone()
            } else {
                child.parent_mobile.clone()
            };
            (Guardian::Parent(name), mobile)
        }
    };
    StartForm {
        student_name: child.name.clone(),
        student_dob: child.dob.clone(),
        student_gender: child.gender.clone(),
        school: child.school.clone(),
        guardian: Some(guardian),
        guardian_mobile: Some(guardian_mobile),
        questionnaire_name: questionnaire.to_string(),
        tnc_accepted: accepted,
    }
}

async fn run_reviews(ctx: &Context, command: ReviewsCommand) -> Result<()> {
    match command {
        ReviewsCommand::List { school, search } => {
            let mut table = ReviewTable::load(&ctx.client).await?;
            if let Some(school) = school {
                table.set_school_filter(&school);
            }
            if let Some(search) = search {
                table.set_search(&search);
            }
            let visible = table.visible();
            for row in &visible {
                println!(
                    "{}  {:<20} {:>3}  {:<20} {:<20} {}",
                    row.session_id,
                    row.student_name,
                    row.student_age.map(|a| a.to_string()).unwrap_or_default(),
                    row.school.as_deref().unwrap_or("-"),
                    row.questionnaire_name.as_deref().unwrap_or("-"),
                    row.diagnosis.as_deref().unwrap_or("(no diagnosis)"),
                );
            }
            println!(
                "\n{} shown, {} of {} diagnosed",
                visible.len(),
                table.diagnosed_count(),
                table.rows().len()
            );
        }
        ReviewsCommand::Schools => {
            let table = ReviewTable::load(&ctx.client).await?;
            for school in table.school_choices() {
                println!("{school}");
            }
        }
        ReviewsCommand::Chat { session_id } => {
            let record = ReviewTable::default()
                .detail(&ctx.client, &session_id)
                .await?;
            println!("{} - {}", record.session_id, record.student_name);
            for turn in &record.conversation {
                println!("[{}] {}", turn.role, turn.message);
            }
            if let Some(feedback) = &record.feedback {
                println!("\nFeedback: {feedback}");
            }
            if let Some(diagnosis) = &record.diagnosis {
                println!("Diagnosis: {diagnosis}");
            }
        }
        ReviewsCommand::Diagnose {
            session_id,
            diagnosis,
        } => {
            let mut table = ReviewTable::load(&ctx.client).await?;
            if table.row(&session_id).is_none() {
                warn!(%session_id, "session not in the current review list");
            }
            table.set_draft(&session_id, diagnosis);
            table.save_draft(&ctx.client, &session_id).await?;
            println!("Diagnosis saved for {session_id}");
        }
    }
    Ok(())
}

/// Config commands read and write files only; no client is built.
pub fn run_config(dir: &Path, command: ConfigCommand) -> Result<()> {
    let mut config = config::load_or_default(dir)?;
    match command {
        ConfigCommand::Show => {
            let credentials = config::load_auth(dir)?;
            let info = config::config_info(dir, &config, credentials.as_ref());
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        ConfigCommand::SetUrl { url } => {
            ApiClient::new(&url, None)?;
            config.base_url = url;
            config::save_config(dir, &config)?;
            println!("Backend set to {}", config.base_url);
        }
    }
    Ok(())
}

fn print_user(user: &User) {
    println!("{} ({})", user.name, user.role);
    println!("mobile: {}", user.mobile);
    if let Some(school) = &user.school {
        println!("school: {school}");
    }
}

fn print_children(children: &[Child]) {
    if children.is_empty() {
        println!("No children found");
        return;
    }
    let today = jiff::Zoned::now().date();
    for child in children {
        let age = child
            .age_on(today)
            .map(|a| a.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{}  {:<20} age {:<3} {:<8} {}",
            child.id, child.name, age, child.gender, child.school
        );
    }
}
