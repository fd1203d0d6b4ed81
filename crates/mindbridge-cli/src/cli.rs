use clap::{Args, Parser, Subcommand, ValueEnum};

use mindbridge_core::models::questionnaire::Audience;
use mindbridge_core::models::user::Role;

#[derive(Debug, Parser)]
#[command(
    name = "mindbridge",
    about = "Administer questionnaires and review responses from the terminal",
    version
)]
pub struct Cli {
    /// Backend base URL. Overrides MINDBRIDGE_API_URL and the config file.
    #[arg(long, global = true, value_name = "url")]
    pub api_url: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the token.
    Login {
        #[arg(long)]
        mobile: String,
        #[arg(long, env = "MINDBRIDGE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token.
    Logout,
    /// Create an account. Request an OTP with `send-otp` first.
    Signup(SignupArgs),
    SendOtp {
        #[arg(long)]
        mobile: String,
    },
    VerifyOtp {
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        otp: String,
    },
    /// Verify an OTP and set a new password.
    ChangePassword {
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        otp: String,
        #[arg(long, env = "MINDBRIDGE_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the signed-in user.
    Profile,
    /// Replace the stored token with a fresh one.
    RefreshToken,
    /// Check that the backend is reachable.
    Ping,
    /// List available questionnaires.
    Questionnaires,
    /// Show one questionnaire's questions.
    Questionnaire { name: String },
    /// List chat models.
    Models,
    /// Make a questionnaire the active one for an audience.
    SetQuestionnaireType {
        name: String,
        #[arg(long, value_enum)]
        audience: AudienceArg,
    },
    #[command(subcommand)]
    Children(ChildrenCommand),
    /// Administer a questionnaire for a child.
    Take(TakeArgs),
    /// Continue a session created elsewhere over the chat stream.
    Resume {
        session_id: String,
        #[arg(long)]
        student: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        age: Option<i64>,
    },
    #[command(subcommand)]
    Reviews(ReviewsCommand),
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Args)]
pub struct SignupArgs {
    #[arg(long)]
    pub role: Role,
    #[arg(long)]
    pub name: String,
    /// Required for teachers.
    #[arg(long, default_value = "")]
    pub school: String,
    #[arg(long)]
    pub mobile: String,
    #[arg(long, env = "MINDBRIDGE_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Defaults to the password.
    #[arg(long)]
    pub confirm_password: Option<String>,
    #[arg(long)]
    pub otp: String,
}

#[derive(Debug, Args)]
pub struct TakeArgs {
    pub child_id: String,
    #[arg(long)]
    pub questionnaire: String,
    /// Chat model; defaults to the configured one.
    #[arg(long)]
    pub model: Option<String>,
    /// Accept the terms and conditions for this session.
    #[arg(long)]
    pub accept_terms: bool,
}

#[derive(Debug, Subcommand)]
pub enum ChildrenCommand {
    /// Children linked to the signed-in guardian.
    List,
    Add(AddChildArgs),
    Delete { child_id: String },
    /// Every child registered at a school.
    BySchool { school: String },
}

#[derive(Debug, Args)]
pub struct AddChildArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    /// Date of birth, YYYY-MM-DD.
    #[arg(long, default_value = "")]
    pub dob: String,
    #[arg(long, default_value = "")]
    pub gender: String,
    #[arg(long, default_value = "")]
    pub school: String,
    #[arg(long, default_value = "")]
    pub parent_name: String,
    #[arg(long, default_value = "")]
    pub parent_mobile: String,
}

#[derive(Debug, Subcommand)]
pub enum ReviewsCommand {
    /// Sessions awaiting or holding a diagnosis.
    List {
        #[arg(long)]
        school: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    Schools,
    /// Print a session's full conversation.
    Chat { session_id: String },
    Diagnose {
        session_id: String,
        diagnosis: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    Show,
    SetUrl { url: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AudienceArg {
    Parent,
    Child,
    Teacher,
}

impl From<AudienceArg> for Audience {
    fn from(arg: AudienceArg) -> Self {
        match arg {
            AudienceArg::Parent => Audience::Parent,
            AudienceArg::Child => Audience::Child,
            AudienceArg::Teacher => Audience::Teacher,
        }
    }
}
