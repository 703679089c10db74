use std::io::BufRead;
use std::process;
use std::sync::Arc;
use std::time::Instant;

use lettore::{
    application::{
        api::BlogApi,
        error::AppError,
        events::{SessionEvent, ViewingSession},
        like::LikeController,
        view::ViewRecorder,
        visibility::VisibilitySample,
    },
    config,
    domain::types::{PostId, UserId},
    infra::{error::InfraError, http::HttpBlogApi, telemetry},
    presentation::terminal::{self, TerminalLikeControl, TerminalNotifier},
    session::{SessionDocument, SessionStore},
};
use tokio::sync::mpsc;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        config::Command::Read(args) => run_read(settings, args).await,
        config::Command::Login(args) => run_login(settings, args).await,
        config::Command::Logout(_) => run_logout(settings).await,
        config::Command::Session(args) => run_session(settings, args.action).await,
    }
}

fn build_api(settings: &config::Settings) -> Result<Arc<HttpBlogApi>, AppError> {
    let site = settings.api.site_url.as_deref().ok_or_else(|| {
        AppError::from(InfraError::configuration(
            "site url is not configured (use --site or LETTORE_SITE_URL)",
        ))
    })?;
    let api = HttpBlogApi::new(site, settings.api.api_key.clone(), settings.api.timeout)
        .map_err(AppError::from)?;
    Ok(Arc::new(api))
}

async fn run_read(settings: config::Settings, args: config::ReadArgs) -> Result<(), AppError> {
    let api = build_api(&settings)?;
    let session_path = settings.session.file_path();
    let mut doc = SessionDocument::load(&session_path)
        .await
        .map_err(AppError::from)?;

    let post_id = PostId(args.post_id);
    let viewer = args.user.map(UserId).or(doc.user);

    let post = api.fetch_post(post_id).await.map_err(AppError::from)?;
    terminal::render_post(&post);

    // Anonymous viewers get no like control and no view tracking.
    let Some(user) = viewer else {
        println!();
        println!("Log in to like posts and have your views counted: lettore login --user <id>");
        return Ok(());
    };

    let store = Arc::new(doc.open_store());
    let like = Arc::new(LikeController::new(
        post_id,
        user,
        api.clone(),
        store.clone(),
        Arc::new(TerminalLikeControl::new()),
        Arc::new(TerminalNotifier),
    ));
    let view = Arc::new(ViewRecorder::new(
        post_id,
        user,
        api.clone(),
        store.clone(),
        settings.tracking.visibility_threshold,
        settings.tracking.visibility_debounce,
    ));
    let session = ViewingSession::new(like, view);
    session.start(post.likes).await;

    let (tx, rx) = mpsc::channel::<SessionEvent>(16);

    // Key presses come from a blocking reader thread; EOF ends the session.
    let key_tx = tx.clone();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let event = match line.trim() {
                "l" | "like" => SessionEvent::ToggleClicked,
                "q" | "quit" => SessionEvent::Quit,
                _ => continue,
            };
            let quit = matches!(event, SessionEvent::Quit);
            if key_tx.blocking_send(event).is_err() || quit {
                return;
            }
        }
        let _ = key_tx.blocking_send(SessionEvent::Quit);
    });

    // Dwell-time fallback trigger.
    let dwell_tx = tx.clone();
    let dwell = settings.tracking.dwell;
    tokio::spawn(async move {
        tokio::time::sleep(dwell).await;
        let _ = dwell_tx.send(SessionEvent::DwellElapsed).await;
    });

    // With the whole post printed, the content end is fully visible; sample
    // that state periodically so the debounce window has a signal to measure.
    let sample_tx = tx.clone();
    let sample_interval = settings.tracking.visibility_sample_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sample_interval);
        loop {
            ticker.tick().await;
            let sample = VisibilitySample::new(1.0, Instant::now());
            if sample_tx.send(SessionEvent::Visibility(sample)).await.is_err() {
                break;
            }
        }
    });

    drop(tx);
    session.run(rx).await;

    doc.absorb(&store);
    doc.persist(&session_path).await.map_err(AppError::from)?;
    info!(
        post = %post_id,
        user = %user,
        "Viewing session saved"
    );
    Ok(())
}

async fn run_login(settings: config::Settings, args: config::LoginArgs) -> Result<(), AppError> {
    let session_path = settings.session.file_path();
    let mut doc = SessionDocument::load(&session_path)
        .await
        .map_err(AppError::from)?;

    let user = UserId(args.user);
    if let Some(previous) = doc.user {
        if previous != user {
            // No stale flags may survive a viewer switch.
            let store = doc.open_store();
            let removed = store.clear_for_user(previous);
            doc.absorb(&store);
            info!(
                previous_user = %previous,
                removed,
                "Cleared departing viewer's session flags"
            );
        }
    }
    doc.user = Some(user);
    doc.persist(&session_path).await.map_err(AppError::from)?;

    println!("Logged in as user {user}.");
    Ok(())
}

async fn run_logout(settings: config::Settings) -> Result<(), AppError> {
    let session_path = settings.session.file_path();
    let mut doc = SessionDocument::load(&session_path)
        .await
        .map_err(AppError::from)?;

    match doc.user.take() {
        Some(user) => {
            let store = doc.open_store();
            let removed = store.clear_for_user(user);
            doc.absorb(&store);
            doc.persist(&session_path).await.map_err(AppError::from)?;
            println!("Logged out user {user}; cleared {removed} session flags.");
        }
        None => {
            println!("No viewer is logged in.");
        }
    }
    Ok(())
}

async fn run_session(
    settings: config::Settings,
    action: config::SessionAction,
) -> Result<(), AppError> {
    let session_path = settings.session.file_path();
    let mut doc = SessionDocument::load(&session_path)
        .await
        .map_err(AppError::from)?;

    match action {
        config::SessionAction::Show(_) => {
            println!("session {}", doc.session_id);
            match doc.user {
                Some(user) => println!("user {user}"),
                None => println!("user (none)"),
            }
            if doc.entries.is_empty() {
                println!("(no cached flags)");
            } else {
                for (key, value) in &doc.entries {
                    println!("{key} = {value}");
                }
            }
        }
        config::SessionAction::ClearViewed(_) => {
            let store: SessionStore = doc.open_store();
            let removed = store.clear_all_viewed();
            doc.absorb(&store);
            doc.persist(&session_path).await.map_err(AppError::from)?;
            println!("Removed {removed} viewed flags.");
        }
        config::SessionAction::ClearLiked(_) => {
            let store: SessionStore = doc.open_store();
            let removed = store.clear_all_liked();
            doc.absorb(&store);
            doc.persist(&session_path).await.map_err(AppError::from)?;
            println!("Removed {removed} liked flags.");
        }
    }
    Ok(())
}
