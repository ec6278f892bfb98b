//! `eventnest`: command-line view layer for the EventNest client library.
//!
//! Every subcommand is a navigation. The session is restored from the data
//! directory first (one revalidation if a credential is stored), the target
//! route goes through the authorization gate, and only then does the page
//! load and render. Toasts are flushed to stderr before exit.

mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use eventnest::config::{ClientConfig, ConfigError};
use eventnest::net::api::ApiClient;
use eventnest::net::error::ApiError;
use eventnest::net::types::{Category, Id, Role};
use eventnest::pages::admin::{AttendancePage, EditorMode, EventDraft, EventEditor, UsersPage, overview_cards};
use eventnest::pages::dashboard::DashboardPage;
use eventnest::pages::events::{EventDetailPage, EventsPage, HomePage};
use eventnest::pages::login::{AuthMode, LoginForm};
use eventnest::pages::{Effect, PageContext};
use eventnest::router::{Gate, History, Navigation, Route};
use eventnest::state::session::SessionStore;
use eventnest::state::storage::{CredentialStore, FileStore};
use eventnest::state::toast::Toasts;
use output::Output;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not create API client: {0}")]
    Client(#[from] ApiError),
    #[error("{0}")]
    Form(String),
    #[error("{from} is not available to this session (redirected to {to})")]
    Redirected { from: Route, to: Route },
    #[error("{0} is waiting for the session to be confirmed")]
    Pending(Route),
    #[error("page not found: {0}")]
    NotFound(String),
    #[error("{0} failed")]
    ActionFailed(&'static str),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "eventnest", about = "EventNest campus events client")]
struct Cli {
    /// Backend base URL.
    #[arg(long, env = "EVENTNEST_API_URL")]
    api_url: Option<String>,

    /// Directory holding the stored credential.
    #[arg(long, env = "EVENTNEST_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Print page data as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the credential.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "EVENTNEST_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "EVENTNEST_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored credential.
    Logout,
    /// Show the current session.
    Whoami,
    /// Render any route by path, e.g. `/events/3`.
    Open { path: String },
    /// Featured events.
    Home,
    Events(EventsCommand),
    /// Your registrations and certificates.
    Dashboard,
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct EventsCommand {
    #[command(subcommand)]
    command: EventsSubcommand,
}

#[derive(Subcommand, Debug)]
enum EventsSubcommand {
    List {
        #[arg(long)]
        category: Option<Category>,
        #[arg(long, default_value = "")]
        search: String,
    },
    Show {
        id: Id,
    },
    Register {
        id: Id,
    },
    Create(EventFields),
    Edit {
        id: Id,
        #[command(flatten)]
        edits: EventEdits,
    },
}

#[derive(Args, Debug)]
struct EventFields {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    /// `YYYY-MM-DDTHH:MM` (UTC) or RFC 3339.
    #[arg(long)]
    date: String,
    #[arg(long)]
    location: String,
    #[arg(long, default_value = "tech")]
    category: Category,
    #[arg(long)]
    image_url: Option<String>,
}

#[derive(Args, Debug)]
struct EventEdits {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    category: Option<Category>,
    #[arg(long)]
    image_url: Option<String>,
}

impl EventEdits {
    fn apply(self, draft: &mut EventDraft) {
        let Self { title, description, date, location, category, image_url } = self;
        for (field, value) in [
            (&mut draft.title, title),
            (&mut draft.description, description),
            (&mut draft.date, date),
            (&mut draft.location, location),
            (&mut draft.image_url, image_url),
        ] {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(category) = category {
            draft.category = category;
        }
    }
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Overview,
    /// Registrations for one event.
    Attendance {
        event_id: Id,
    },
    /// Mark a registration attended.
    Attend {
        event_id: Id,
        registration_id: Id,
    },
    /// Issue certificates for an event.
    Certificates {
        event_id: Id,
    },
    Users,
    SetRole {
        user_id: Id,
        role: Role,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();

    let app = App::start(&cli).await?;
    let result = app.run(cli.command).await;
    app.output.toasts(&app.ctx.toasts);
    result
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// APP
// =============================================================================

struct App {
    session: SessionStore,
    ctx: PageContext,
    output: Output,
}

impl App {
    async fn start(cli: &Cli) -> Result<Self, CliError> {
        let config = ClientConfig::resolve(cli.api_url.as_deref(), cli.data_dir.clone(), dirs::data_dir())?;
        let storage: Arc<dyn CredentialStore> = Arc::new(FileStore::new(&config.data_dir));
        let api = ApiClient::new(&config.api_url, storage.clone())?;
        let session = SessionStore::new(Arc::new(api.clone()), storage);

        if !matches!(cli.command, Command::Logout) {
            let phase = session.restore().await;
            tracing::debug!(?phase, api_url = %config.api_url, "session restored");
        }

        Ok(Self { session, ctx: PageContext::new(api, Toasts::new()), output: Output::new(cli.json) })
    }

    async fn run(&self, command: Command) -> Result<(), CliError> {
        match command {
            Command::Login { email, password } => {
                let mut form = LoginForm::new(AuthMode::Login);
                form.email = email;
                form.password = password;
                self.submit(form).await
            }
            Command::Register { name, email, password } => {
                let mut form = LoginForm::new(AuthMode::SignUp);
                form.name = name;
                form.email = email;
                form.password = password;
                self.submit(form).await
            }
            Command::Logout => {
                self.session.logout();
                self.output.notice("Logged out.");
                Ok(())
            }
            Command::Whoami => {
                let state = self.session.state();
                let value = json!({ "phase": format!("{:?}", state.phase()), "user": state.profile() });
                Ok(self.output.emit(&value, || output::session_text(&state))?)
            }
            Command::Open { path } => self.show(Route::parse(&path)).await,
            Command::Home => self.show(Route::Home).await,
            Command::Dashboard => self.show(Route::Dashboard).await,
            Command::Events(events) => self.run_events(events.command).await,
            Command::Admin(admin) => self.run_admin(admin.command).await,
        }
    }

    async fn run_events(&self, command: EventsSubcommand) -> Result<(), CliError> {
        match command {
            EventsSubcommand::List { category, search } => {
                self.enter(Route::Events)?;
                let mut page = EventsPage::new(self.ctx.clone());
                if !page.search(category, &search).await {
                    return Err(CliError::ActionFailed("loading events"));
                }
                Ok(self.output.emit(page.events(), || output::events_text("All Events", page.events()))?)
            }
            EventsSubcommand::Show { id } => self.show(Route::EventDetail(id)).await,
            EventsSubcommand::Register { id } => {
                let route = self.enter(Route::EventDetail(id.clone()))?;
                let mut page = EventDetailPage::new(self.ctx.clone(), id);
                if let Effect::Navigate(next) = page.load().await {
                    return Err(CliError::Redirected { from: route, to: next });
                }
                if let Effect::Navigate(next) = page.register(&self.session.state()).await {
                    return Err(CliError::Redirected { from: route, to: next });
                }
                if !page.is_registered() {
                    return Err(CliError::ActionFailed("registration"));
                }
                Ok(())
            }
            EventsSubcommand::Create(fields) => {
                self.enter(Route::NewEvent)?;
                let mut editor = EventEditor::new(self.ctx.clone(), EditorMode::Create);
                editor.draft = EventDraft {
                    title: fields.title,
                    description: fields.description,
                    date: fields.date,
                    location: fields.location,
                    category: fields.category,
                    image_url: fields.image_url.unwrap_or_default(),
                };
                self.save(editor).await
            }
            EventsSubcommand::Edit { id, edits } => {
                let route = self.enter(Route::EditEvent(id.clone()))?;
                let mut editor = EventEditor::new(self.ctx.clone(), EditorMode::Edit(id));
                if let Effect::Navigate(next) = editor.load().await {
                    return Err(CliError::Redirected { from: route, to: next });
                }
                edits.apply(&mut editor.draft);
                self.save(editor).await
            }
        }
    }

    async fn run_admin(&self, command: AdminSubcommand) -> Result<(), CliError> {
        match command {
            AdminSubcommand::Overview => self.show(Route::Admin).await,
            AdminSubcommand::Attendance { event_id } => self.show(Route::Attendance(event_id)).await,
            AdminSubcommand::Attend { event_id, registration_id } => {
                self.enter(Route::Attendance(event_id.clone()))?;
                let mut page = AttendancePage::new(self.ctx.clone(), event_id);
                if !page.mark_attended(&registration_id).await {
                    return Err(CliError::ActionFailed("marking attendance"));
                }
                Ok(())
            }
            AdminSubcommand::Certificates { event_id } => {
                self.enter(Route::Attendance(event_id.clone()))?;
                let page = AttendancePage::new(self.ctx.clone(), event_id);
                if !page.generate_certificates().await {
                    return Err(CliError::ActionFailed("generating certificates"));
                }
                Ok(())
            }
            AdminSubcommand::Users => self.show(Route::ManageUsers).await,
            AdminSubcommand::SetRole { user_id, role } => {
                self.enter(Route::ManageUsers)?;
                let mut page = UsersPage::new(self.ctx.clone());
                if !page.set_role(&user_id, role).await {
                    return Err(CliError::ActionFailed("updating role"));
                }
                Ok(())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Gate `target` against the current session.
    fn enter(&self, target: Route) -> Result<Route, CliError> {
        let mut history = History::new(Route::Home, Gate::default());
        match history.go(&self.session.state(), target) {
            Navigation::Rendered(route) => Ok(route),
            Navigation::Redirected { from, to } => Err(CliError::Redirected { from, to }),
            Navigation::Pending(route) => Err(CliError::Pending(route)),
        }
    }

    /// Gate, load and render `target`, following page-initiated navigations.
    async fn show(&self, target: Route) -> Result<(), CliError> {
        let mut route = self.enter(target)?;
        loop {
            match self.render(&route).await? {
                Effect::Stay => return Ok(()),
                Effect::Navigate(next) => {
                    self.output.notice(&format!("→ {next}"));
                    route = self.enter(next)?;
                }
            }
        }
    }

    async fn render(&self, route: &Route) -> Result<Effect, CliError> {
        let out = self.output;
        let state = self.session.state();
        match route {
            Route::Home => {
                let mut page = HomePage::new(self.ctx.clone());
                page.load().await;
                out.emit(page.featured(), || output::events_text("Featured Events", page.featured()))?;
            }
            Route::Events => {
                let mut page = EventsPage::new(self.ctx.clone());
                if !page.refresh().await {
                    return Err(CliError::ActionFailed("loading events"));
                }
                out.emit(page.events(), || output::events_text(route.title(), page.events()))?;
            }
            Route::EventDetail(id) => {
                let mut page = EventDetailPage::new(self.ctx.clone(), id.clone());
                if let effect @ Effect::Navigate(_) = page.load().await {
                    return Ok(effect);
                }
                if let Some(event) = page.event() {
                    let can_register = EventDetailPage::can_register(&state);
                    out.emit(event, || output::event_text(event, can_register))?;
                }
            }
            Route::Login => {
                out.emit(&json!({ "title": route.title() }), || {
                    output::title_text("Sign in with `eventnest login` or create an account with `eventnest register`.")
                })?;
            }
            Route::Dashboard => {
                let mut page = DashboardPage::new(self.ctx.clone());
                if !page.load().await {
                    return Err(CliError::ActionFailed("loading dashboard"));
                }
                let value = json!({
                    "user": state.profile(),
                    "registrations": page.registrations(),
                    "certificates": page.certificates(),
                });
                out.emit(&value, || {
                    output::dashboard_text(state.profile(), page.registrations(), page.certificates())
                })?;
            }
            Route::Admin => {
                let cards = overview_cards(state.role());
                let value: Vec<_> = cards
                    .iter()
                    .map(|card| json!({ "title": card.title, "path": card.route.path() }))
                    .collect();
                out.emit(&value, || output::cards_text(state.profile(), &cards))?;
            }
            Route::NewEvent => {
                out.emit(&json!({ "title": route.title() }), || {
                    output::title_text("Create an event with `eventnest events create`.")
                })?;
            }
            Route::EditEvent(id) => {
                let mut editor = EventEditor::new(self.ctx.clone(), EditorMode::Edit(id.clone()));
                if let effect @ Effect::Navigate(_) = editor.load().await {
                    return Ok(effect);
                }
                let draft = &editor.draft;
                let value = json!({
                    "title": draft.title,
                    "description": draft.description,
                    "date": draft.date,
                    "location": draft.location,
                    "category": draft.category,
                    "image_url": draft.image_url,
                });
                out.emit(&value, || output::draft_text(route.title(), draft))?;
            }
            Route::Attendance(id) => {
                let mut page = AttendancePage::new(self.ctx.clone(), id.clone());
                if !page.load().await {
                    return Err(CliError::ActionFailed("loading attendance"));
                }
                let value = json!({ "event": page.event(), "registrations": page.registrations() });
                out.emit(&value, || output::attendance_text(page.event(), page.registrations()))?;
            }
            Route::ManageUsers => {
                let mut page = UsersPage::new(self.ctx.clone());
                if !page.load().await {
                    return Err(CliError::ActionFailed("loading users"));
                }
                out.emit(page.users(), || output::users_text(page.users()))?;
            }
            Route::News | Route::Faq | Route::About | Route::Contact => {
                out.emit(&json!({ "title": route.title() }), || output::title_text(route.title()))?;
            }
            Route::NotFound(path) => return Err(CliError::NotFound(path.clone())),
        }
        Ok(Effect::Stay)
    }

    // -------------------------------------------------------------------------
    // Forms
    // -------------------------------------------------------------------------

    async fn submit(&self, mut form: LoginForm) -> Result<(), CliError> {
        self.enter(Route::Login)?;
        match form.submit(&self.session, &self.ctx.toasts).await {
            Effect::Navigate(_) => {
                let state = self.session.state();
                Ok(self.output.emit(&state.profile(), || output::session_text(&state))?)
            }
            Effect::Stay => Err(CliError::Form(form.error().unwrap_or("sign-in failed").to_owned())),
        }
    }

    async fn save(&self, mut editor: EventEditor) -> Result<(), CliError> {
        match editor.save().await {
            Effect::Navigate(_) => Ok(()),
            Effect::Stay => match editor.error() {
                Some(message) => Err(CliError::Form(message.to_owned())),
                None => Err(CliError::ActionFailed("saving event")),
            },
        }
    }
}
