use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use aster_harness::cli::{Cli, Command};
use aster_harness::config::{DataPaths, HarnessConfig};
use aster_harness::core::{FrameQueue, GpuContext, SurfaceId, SurfacePresenter, Throttled, Viewport};
use aster_harness::definitions::{SourceLoader, SourceTracker};
use aster_harness::store::{DirectoryBlobStore, FileKv, JsonRecordStore};
use aster_harness::traits::{LogNotifier, Mount, Navigator, Notifier};
use aster_harness::{
    CaptureState, CaptureSubsystem, Gallery, Harness, HarnessError, SceneHost, SoftwareRendererFactory,
    SubmissionPipeline, SubmissionState,
};

// === Constants ===

const SOURCE_POLL_INTERVAL: Duration = Duration::from_millis(500);

// === Host adapters ===

/// Mount point backed by the preview window
struct WindowMount {
    window: Arc<Window>,
    attached: Option<SurfaceId>,
}

impl Mount for WindowMount {
    fn viewport(&self) -> Viewport {
        let size = self.window.inner_size();
        let scale = self.window.scale_factor();
        let logical = |v: u32| (v as f64 / scale).round() as u32;
        Viewport::new(logical(size.width), logical(size.height), scale as f32)
    }

    fn attach(&mut self, surface: SurfaceId) {
        log::debug!("surface {:?} attached to window", surface);
        self.attached = Some(surface);
    }

    fn detach(&mut self, surface: SurfaceId) {
        if self.attached == Some(surface) {
            log::debug!("surface {:?} detached from window", surface);
            self.attached = None;
        }
    }
}

/// Leaves the preview for the gallery once the delay has passed
#[derive(Default)]
struct GalleryRedirect {
    at: Cell<Option<Instant>>,
    fired: Cell<bool>,
}

impl GalleryRedirect {
    fn due(&self, now: Instant) -> bool {
        match self.at.get() {
            Some(at) if now >= at => {
                self.at.set(None);
                self.fired.set(true);
                true
            }
            _ => false,
        }
    }
}

impl Navigator for GalleryRedirect {
    fn navigate_to_gallery(&self, after: Duration) {
        log::info!("opening gallery in {:?}", after);
        self.at.set(Some(Instant::now() + after));
    }
}

/// Where the live definition's source text comes from
enum DefinitionSource {
    /// Watched file, reloaded when its text changes
    File(PathBuf),
    Builtin(String),
}

impl DefinitionSource {
    fn read(&self) -> Option<String> {
        match self {
            DefinitionSource::File(path) => match std::fs::read_to_string(path) {
                Ok(text) => Some(text),
                Err(e) => {
                    log::warn!("cannot read {}: {}", path.display(), e);
                    None
                }
            },
            DefinitionSource::Builtin(name) => Some(name.clone()),
        }
    }
}

// === Application ===

struct Preview {
    window: Arc<Window>,
    harness: Harness<WindowMount, FrameQueue>,
    presenter: SurfacePresenter,
}

struct App {
    config: HarnessConfig,
    source: DefinitionSource,
    author: Option<String>,
    notifier: Rc<dyn Notifier>,
    redirect: Rc<GalleryRedirect>,
    pipeline: SubmissionPipeline,
    tracker: SourceTracker<SourceLoader>,
    source_poll: Throttled,
    pool: LocalPool,
    preview: Option<Preview>,
    shown_title: String,
}

impl App {
    fn new(config: HarnessConfig, paths: &DataPaths, source: DefinitionSource, author: Option<String>) -> Self {
        let notifier: Rc<dyn Notifier> = Rc::new(LogNotifier);
        let redirect = Rc::new(GalleryRedirect::default());
        let pipeline = SubmissionPipeline::new(
            Rc::new(DirectoryBlobStore::new(paths.clips())),
            Rc::new(JsonRecordStore::new(paths.submissions())),
            Rc::clone(&notifier),
            redirect.clone(),
            config.submission.clone(),
        );

        Self {
            shown_title: config.window.title.clone(),
            config,
            source,
            author,
            notifier,
            redirect,
            pipeline,
            tracker: SourceTracker::new(SourceLoader::default()),
            source_poll: Throttled::new(SOURCE_POLL_INTERVAL),
            pool: LocalPool::new(),
            preview: None,
        }
    }

    fn open_preview(&self, window: Arc<Window>) -> Result<Preview> {
        let (gpu, surface) = pollster::block_on(GpuContext::for_window(window.clone()))?;
        let size = window.inner_size();
        let presenter = SurfacePresenter::new(gpu, surface, size.width, size.height)?;

        let harness = Harness::new(
            SceneHost::new(Box::new(SoftwareRendererFactory), self.config.camera),
            WindowMount {
                window: window.clone(),
                attached: None,
            },
            FrameQueue::new(),
            Rc::clone(&self.notifier),
            CaptureSubsystem::mjpeg(self.config.capture),
            self.config.background,
        );

        Ok(Preview {
            window,
            harness,
            presenter,
        })
    }

    /// Feed changed source text to the harness
    fn poll_source(&mut self, now: Instant) {
        if !self.source_poll.try_tick(now) {
            return;
        }
        let Some(preview) = self.preview.as_mut() else {
            return;
        };
        let Some(text) = self.source.read() else {
            return;
        };
        match self.tracker.update(&text) {
            Ok(Some(definition)) => preview.harness.set_definition(definition, now),
            Ok(None) => {}
            Err(e) => self.notifier.contract_error(&e.to_string()),
        }
    }

    /// Enter: confirm and start recording in one go
    fn submit(&mut self, now: Instant) {
        let Some(preview) = self.preview.as_mut() else {
            return;
        };
        if let Err(e) = self.pipeline.open().and_then(|_| self.pipeline.confirm()) {
            log::warn!("{e}");
            return;
        }

        let author = self.author.clone().unwrap_or_default();
        match self.pipeline.provide_identity(&author, &mut preview.harness, now) {
            Ok(()) => {}
            Err(HarnessError::Validation(_)) => {
                log::warn!("pass --author to submit");
                if let Err(e) = self.pipeline.cancel() {
                    log::warn!("cannot cancel submission: {e}");
                }
            }
            Err(e) => log::warn!("submission not started: {e}"),
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        self.poll_source(now);

        let Some(preview) = self.preview.as_mut() else {
            return;
        };
        preview.harness.pump(now);

        if let Some(outcome) = preview.harness.take_capture_outcome() {
            let source = self.tracker.source().unwrap_or_default().to_string();
            let task = self.pipeline.on_capture_finished(outcome, source);
            let spawned = self.pool.spawner().spawn_local(async move {
                if let Err(e) = task.await {
                    log::error!("submission failed: {e}");
                }
            });
            if let Err(e) = spawned {
                log::error!("cannot run submission: {e}");
            }
        }
        self.pool.run_until_stalled();

        let placeholder = preview.harness.placeholder_color().to_rgba8();
        let (width, height, pixels) = preview.harness.frame_pixels().unwrap_or((1, 1, &placeholder[..]));
        if let Err(e) = preview.presenter.present(width, height, pixels) {
            log::error!("present failed: {e}");
        }

        let mut title = self.config.window.title.clone();
        match self.pipeline.state() {
            SubmissionState::Idle => {}
            state => title.push_str(&format!(" [{state:?}]")),
        }
        let recording = preview.harness.capture().session().filter(|s| s.state() == CaptureState::Recording);
        if let Some(session) = recording {
            title.push_str(&format!(" {:.0}%", session.progress(now) * 100.0));
        }
        if title != self.shown_title {
            preview.window.set_title(&title);
            self.shown_title = title;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.preview.is_some() {
            return;
        }
        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title(self.config.window.title.clone())
                .with_inner_size(winit::dpi::LogicalSize::new(
                    self.config.window.width,
                    self.config.window.height,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        match self.open_preview(window) {
            Ok(preview) => self.preview = Some(preview),
            Err(e) => {
                log::error!("failed to initialize preview: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Enter),
                        repeat: false,
                        ..
                    },
                ..
            } => self.submit(Instant::now()),
            WindowEvent::Resized(size) => {
                if let Some(preview) = self.preview.as_mut() {
                    preview.harness.on_resize();
                    preview.presenter.resize(size.width, size.height);
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(preview) = self.preview.as_mut() {
                    preview.harness.on_resize();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.redirect.due(Instant::now()) {
            event_loop.exit();
            return;
        }
        if let Some(preview) = &self.preview {
            preview.window.request_redraw();
        }
    }
}

// === Commands ===

fn gallery(config: &HarnessConfig, paths: &DataPaths) -> Gallery {
    Gallery::new(
        Rc::new(JsonRecordStore::new(paths.submissions())),
        Rc::new(FileKv::new(paths.flags())),
        Rc::new(LogNotifier),
        config.submission.table.clone(),
        config.vote_flag_key.clone(),
    )
}

fn print_gallery(config: &HarnessConfig, paths: &DataPaths) -> Result<()> {
    let mut gallery = gallery(config, paths);
    pollster::block_on(gallery.refresh())?;

    if gallery.rows().is_empty() {
        println!("No submissions yet.");
    }
    for row in gallery.ranked() {
        println!("{:>4}  {:<24} {}", row.vote, row.user, row.video_url);
    }
    if gallery.has_voted() {
        println!("(you have already voted)");
    }
    Ok(())
}

fn run(config: HarnessConfig, paths: &DataPaths, source: DefinitionSource, author: Option<String>) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config.clone(), paths, source, author);

    println!("Aster Competition - Enter to submit, Escape to quit");
    event_loop.run_app(&mut app)?;

    if app.redirect.fired.get() {
        print_gallery(&config, paths)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = HarnessConfig::load(cli.config.as_deref())?;
    let paths = DataPaths::new(cli.data_dir);

    match cli.command {
        Command::Run {
            source,
            builtin,
            author,
        } => {
            let source = match source {
                Some(path) => DefinitionSource::File(path),
                None => DefinitionSource::Builtin(builtin),
            };
            run(config, &paths, source, author)
        }
        Command::Gallery => print_gallery(&config, &paths),
        Command::Vote { user } => {
            let mut gallery = gallery(&config, &paths);
            pollster::block_on(gallery.vote(&user))?;
            println!("Vote cast for {user}.");
            Ok(())
        }
    }
}
