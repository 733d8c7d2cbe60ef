use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use iced::futures::{SinkExt, Stream};
use iced::widget::{button, column, container, image, scrollable, text};
use iced::{Alignment, Element, Length, Subscription, Task, Theme};
use iced_aw::Wrap;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedSender};

use media_gallery::config::Config;
use media_gallery::controller::GalleryController;
use media_gallery::error::GalleryError;
use media_gallery::logging;
use media_gallery::playback::{
    ExternalEngines, PlaybackMachine, PlaybackStatus, PlayerEvent, TokioFallbackTimer,
};
use media_gallery::render::{Advance, Batch, ScrollPosition, ScrollWatcher};
use media_gallery::state::collection::SortKey;
use media_gallery::state::data::{MediaRecord, Orientation, Quality, RecordId};
use media_gallery::state::preferences::{
    MemoryPreferenceStore, PreferenceStore, Preferences, SqlitePreferenceStore,
};
use media_gallery::transport::HttpTransport;

mod ui;

use ui::toolbar::Choice;

type Gallery = GalleryController<ScrollWatcher, Box<dyn PreferenceStore>>;
type Player = PlaybackMachine<ExternalEngines, TokioFallbackTimer>;
/// Errors cross the iced message boundary, which requires `Clone`
type Failure = Arc<GalleryError>;

/// Main application state
struct MediaGallery {
    config: Config,
    /// Runtime hosting player processes and fallback timers
    runtime: Handle,
    transport: HttpTransport,
    gallery: Gallery,
    /// Created once the player event channel is connected
    player: Option<Player>,
    /// Record behind the current playback target, kept when it leaves the view
    now_playing: Option<MediaRecord>,
    thumbnails: HashMap<RecordId, image::Handle>,
    search: String,
    identity: String,
    /// Status message to display to the user
    status: String,
    busy: bool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    Refresh,
    RecordsLoaded(Result<Vec<MediaRecord>, Failure>),
    Rescan,
    Rescanned(Result<(), Failure>),
    ThumbnailLoaded(RecordId, Result<Vec<u8>, Failure>),
    Scrolled(scrollable::Viewport),
    ShowMore,
    SortKeyChanged(SortKey),
    SortDirectionToggled,
    FavoritesFirstToggled(bool),
    OrientationChanged(Choice<Orientation>),
    QualityChanged(Choice<Quality>),
    SearchChanged(String),
    IdentityChanged(String),
    IdentitySubmitted,
    ToggleFavorite(RecordId),
    Delete(RecordId),
    Deleted(RecordId, Result<(), Failure>),
    Play(RecordId),
    PlayResolved(Result<MediaRecord, Failure>),
    EventsConnected(UnboundedSender<PlayerEvent>),
    Player(PlayerEvent),
    Retry,
    StopPlayback,
    Download,
}

impl MediaGallery {
    fn new(config: Config, runtime: Handle, transport: HttpTransport) -> (Self, Task<Message>) {
        let preferences = Preferences::new(open_preferences(&config));
        let identity = preferences.identity().unwrap_or_default();
        let batch_size = NonZeroUsize::new(config.batch_size).unwrap_or(NonZeroUsize::MIN);
        let watcher = ScrollWatcher::new(config.visibility_margin);

        tracing::info!("Media gallery started against {}", transport.base_url());

        let app = MediaGallery {
            gallery: GalleryController::new(preferences, batch_size, watcher),
            config,
            runtime,
            transport,
            player: None,
            now_playing: None,
            thumbnails: HashMap::new(),
            search: String::new(),
            identity,
            status: "Loading library...".to_string(),
            busy: true,
        };
        let task = app.fetch_records();
        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Refresh => {
                self.busy = true;
                self.status = "Loading library...".to_string();
                self.fetch_records()
            }
            Message::RecordsLoaded(Ok(records)) => {
                self.busy = false;
                let batch = self.gallery.load(records);
                self.status = self.summary();
                self.after_reset(batch)
            }
            Message::RecordsLoaded(Err(err)) => {
                self.busy = false;
                tracing::warn!("Fetching records failed: {}", err);
                self.status = format!("Could not load library: {}", err);
                Task::none()
            }
            Message::Rescan => {
                self.busy = true;
                self.status = "Rescanning library...".to_string();
                let transport = self.transport.clone();
                Task::perform(
                    async move { transport.reload_library().await.map_err(Arc::new) },
                    Message::Rescanned,
                )
            }
            Message::Rescanned(Ok(())) => self.fetch_records(),
            Message::Rescanned(Err(err)) => {
                self.busy = false;
                self.status = format!("Rescan failed: {}", err);
                Task::none()
            }
            Message::ThumbnailLoaded(id, Ok(bytes)) => {
                self.thumbnails.insert(id, image::Handle::from_bytes(bytes));
                Task::none()
            }
            Message::ThumbnailLoaded(id, Err(err)) => {
                tracing::debug!("No thumbnail for {}: {}", id, err);
                Task::none()
            }
            Message::Scrolled(viewport) => {
                let position = ScrollPosition {
                    offset_y: viewport.absolute_offset().y,
                    viewport_height: viewport.bounds().height,
                    content_height: viewport.content_bounds().height,
                };
                match self.gallery.watcher_mut().observe(position) {
                    Some(element) => {
                        let advance = self.gallery.on_visible(&element);
                        self.apply_advance(advance)
                    }
                    None => Task::none(),
                }
            }
            Message::ShowMore => match self.gallery.watcher_mut().fire() {
                Some(element) => {
                    let advance = self.gallery.on_visible(&element);
                    self.apply_advance(advance)
                }
                None => Task::none(),
            },
            Message::SortKeyChanged(key) => {
                let mut sort = self.gallery.sort();
                sort.key = Some(key);
                self.reconfigure(|gallery| gallery.set_sort(sort))
            }
            Message::SortDirectionToggled => {
                let mut sort = self.gallery.sort();
                sort.direction = sort.direction.toggled();
                self.reconfigure(|gallery| gallery.set_sort(sort))
            }
            Message::FavoritesFirstToggled(enabled) => {
                let mut sort = self.gallery.sort();
                sort.favorites_first = enabled;
                self.reconfigure(|gallery| gallery.set_sort(sort))
            }
            Message::OrientationChanged(choice) => {
                let mut filter = self.gallery.filter();
                filter.orientation = choice.into_option();
                self.reconfigure(|gallery| gallery.set_filter(filter))
            }
            Message::QualityChanged(choice) => {
                let mut filter = self.gallery.filter();
                filter.quality = choice.into_option();
                self.reconfigure(|gallery| gallery.set_filter(filter))
            }
            Message::SearchChanged(query) => {
                let batch = self.gallery.set_query(&query);
                self.search = query;
                self.after_reset(batch)
            }
            Message::IdentityChanged(name) => {
                self.identity = name;
                Task::none()
            }
            Message::IdentitySubmitted => {
                match self.gallery.set_identity(&self.identity) {
                    Ok(()) => self.status = format!("Signed in as {}", self.identity.trim()),
                    Err(err) => self.notify(&err),
                }
                Task::none()
            }
            Message::ToggleFavorite(id) => {
                match self.gallery.toggle_favorite(&id) {
                    Ok(_) => self.status = self.summary(),
                    Err(err) => self.notify(&err),
                }
                Task::none()
            }
            Message::Delete(id) => {
                let user = match self.gallery.acting_user() {
                    Ok(user) => user,
                    Err(err) => {
                        self.notify(&err);
                        return Task::none();
                    }
                };
                self.status = format!("Deleting {}...", id);
                let transport = self.transport.clone();
                let target = id.clone();
                Task::perform(
                    async move {
                        transport
                            .delete_record(&target, &user)
                            .await
                            .map_err(Arc::new)
                    },
                    move |result| Message::Deleted(id.clone(), result),
                )
            }
            Message::Deleted(id, Ok(())) => {
                if self.player.as_ref().and_then(|p| p.target()) == Some(&id) {
                    if let Some(player) = self.player.as_mut() {
                        player.stop();
                    }
                    self.now_playing = None;
                }
                self.thumbnails.remove(&id);
                match self.gallery.confirm_deleted(&id) {
                    Ok(batch) => {
                        self.status = self.summary();
                        self.after_reset(batch)
                    }
                    Err(err) => {
                        self.notify(&err);
                        Task::none()
                    }
                }
            }
            Message::Deleted(id, Err(err)) => {
                tracing::debug!("Delete of {} rejected", id);
                self.notify(&err);
                Task::none()
            }
            Message::Play(id) => {
                if self.player.is_none() {
                    self.status = "Player is not ready yet".to_string();
                    return Task::none();
                }
                match self.gallery.record(&id).cloned() {
                    Some(record) => {
                        self.start_playback(record);
                        Task::none()
                    }
                    None => {
                        // not in the current view, ask the server for it
                        let transport = self.transport.clone();
                        Task::perform(
                            async move { transport.fetch_record(&id).await.map_err(Arc::new) },
                            Message::PlayResolved,
                        )
                    }
                }
            }
            Message::PlayResolved(Ok(record)) => {
                self.start_playback(record);
                Task::none()
            }
            Message::PlayResolved(Err(err)) => {
                if let GalleryError::NotFound(id) = err.as_ref() {
                    self.status = format!("{} is no longer available", id);
                }
                self.notify(&err);
                Task::none()
            }
            Message::EventsConnected(events) => {
                let engines = ExternalEngines::new(
                    self.runtime.clone(),
                    events.clone(),
                    &self.config.player_command,
                );
                let timer = TokioFallbackTimer::new(self.runtime.clone(), events);
                self.player = Some(PlaybackMachine::new(
                    engines,
                    timer,
                    self.config.fallback_timeout(),
                ));
                Task::none()
            }
            Message::Player(event) => {
                if let Some(player) = self.player.as_mut() {
                    player.handle(event);
                }
                Task::none()
            }
            Message::Retry => {
                if let Some(round) = self.player.as_mut().and_then(|p| p.retry()) {
                    tracing::info!("Retrying playback in round {}", round);
                }
                Task::none()
            }
            Message::StopPlayback => {
                if let Some(player) = self.player.as_mut() {
                    player.stop();
                }
                self.now_playing = None;
                Task::none()
            }
            Message::Download => {
                if let Some(url) = self.player.as_ref().and_then(|p| p.download_url()) {
                    if let Err(err) = open::that_detached(url) {
                        self.status = format!("Could not open download: {}", err);
                    }
                }
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let now = chrono::Utc::now().timestamp();

        let toolbar = ui::toolbar::toolbar(
            self.gallery.sort(),
            self.gallery.filter(),
            &self.search,
            &self.identity,
            self.busy,
        );

        let (status, title, can_download) = match &self.player {
            Some(player) => (
                player.status(),
                self.now_playing
                    .as_ref()
                    .filter(|record| player.target() == Some(&record.id))
                    .map(|record| record.title.as_str()),
                player.download_url().is_some(),
            ),
            None => (PlaybackStatus::Idle, None, false),
        };
        let player = ui::player::player_panel(status, title, can_download);

        let cards: Vec<Element<Message>> = self
            .gallery
            .rendered_records()
            .into_iter()
            .map(|record| ui::card::card(record, self.thumbnails.get(&record.id), now))
            .collect();

        let mut grid = column![].spacing(16).align_x(Alignment::Center);
        if cards.is_empty() {
            let empty = if self.busy { "Loading..." } else { "Nothing to show" };
            grid = grid.push(text(empty).size(18));
        } else {
            grid = grid.push(Wrap::with_elements(cards).spacing(12.0).line_spacing(12.0));
        }
        if self.gallery.has_more() {
            grid = grid.push(button("Show more").on_press(Message::ShowMore));
        }

        let grid = scrollable(container(grid).width(Length::Fill).padding(8))
            .id(grid_id())
            .on_scroll(Message::Scrolled)
            .width(Length::Fill)
            .height(Length::Fill);

        column![toolbar, player, grid, text(self.status.as_str()).size(14)]
            .spacing(12)
            .padding(16)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::run(player_events)
    }

    fn fetch_records(&self) -> Task<Message> {
        let transport = self.transport.clone();
        Task::perform(
            async move { transport.fetch_records().await.map_err(Arc::new) },
            Message::RecordsLoaded,
        )
    }

    fn load_thumbnails(&self, batch: &Batch) -> Task<Message> {
        Task::batch(
            batch
                .ids
                .iter()
                .filter(|id| !self.thumbnails.contains_key(*id))
                .map(|id| {
                    let transport = self.transport.clone();
                    let id = id.clone();
                    Task::perform(
                        async move {
                            let result = transport.fetch_thumbnail(&id).await.map_err(Arc::new);
                            (id, result)
                        },
                        |(id, result)| Message::ThumbnailLoaded(id, result),
                    )
                }),
        )
    }

    /// Scroll back to the top and fetch thumbnails of the first batch
    fn after_reset(&self, batch: Batch) -> Task<Message> {
        Task::batch([
            scrollable::scroll_to(grid_id(), scrollable::AbsoluteOffset { x: 0.0, y: 0.0 }),
            self.load_thumbnails(&batch),
        ])
    }

    fn apply_advance(&mut self, advance: Advance) -> Task<Message> {
        match advance {
            Advance::Emitted(batch) => self.load_thumbnails(&batch),
            Advance::Stale(_) => {
                self.status = "The list changed, refresh to see more".to_string();
                Task::none()
            }
            Advance::Exhausted | Advance::Ignored => Task::none(),
        }
    }

    fn reconfigure(
        &mut self,
        change: impl FnOnce(&mut Gallery) -> media_gallery::Result<Batch>,
    ) -> Task<Message> {
        match change(&mut self.gallery) {
            Ok(batch) => self.after_reset(batch),
            Err(err) => {
                self.notify(&err);
                Task::none()
            }
        }
    }

    fn start_playback(&mut self, record: MediaRecord) {
        if let Some(player) = self.player.as_mut() {
            let round = player.initialize(self.transport.media_source(&record.id));
            tracing::info!("Playback of {} started in round {}", record.id, round);
            self.now_playing = Some(record);
        }
    }

    fn notify(&mut self, err: &GalleryError) {
        tracing::warn!("{}", err);
        if let Some(status) = failure_status(err) {
            self.status = status;
        }
    }

    fn summary(&self) -> String {
        let stats = self.gallery.stats();
        format!(
            "{} videos, {} ({}), {} favorites",
            stats.records,
            stats.gigabytes(),
            stats.megabytes(),
            stats.favorites
        )
    }
}

/// Status line text for an error, `None` for errors the user never sees
fn failure_status(err: &GalleryError) -> Option<String> {
    match err {
        GalleryError::Unauthorized => {
            Some("Not allowed: set a name the server accepts for deletes".to_string())
        }
        err if err.is_user_visible() => Some(err.to_string()),
        _ => None,
    }
}

fn grid_id() -> scrollable::Id {
    scrollable::Id::new("gallery-grid")
}

/// Channel carrying engine and timer signals back into `update`
fn player_events() -> impl Stream<Item = Message> {
    iced::stream::channel(64, |mut output| async move {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        if output.send(Message::EventsConnected(sender)).await.is_err() {
            return;
        }
        while let Some(event) = receiver.recv().await {
            if output.send(Message::Player(event)).await.is_err() {
                break;
            }
        }
    })
}

/// Preferences from SQLite, or an in-memory store when the database is unavailable
fn open_preferences(config: &Config) -> Box<dyn PreferenceStore> {
    let opened = match &config.preferences_path {
        Some(path) => SqlitePreferenceStore::open(path),
        None => SqlitePreferenceStore::new(),
    };
    match opened {
        Ok(store) => {
            tracing::info!("Preferences stored in {}", store.path().display());
            Box::new(store)
        }
        Err(err) => {
            tracing::warn!("Preferences will not persist: {}", err);
            Box::new(MemoryPreferenceStore::default())
        }
    }
}

fn main() -> iced::Result {
    logging::init();

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!("{}; using default settings", err);
        Config::default()
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("media-gallery-playback")
        .enable_all()
        .build()
        .map_err(iced::Error::ExecutorCreationFailed)?;

    let transport = HttpTransport::new(&config.server_url).map_err(|err| {
        iced::Error::ExecutorCreationFailed(std::io::Error::other(err.to_string()))
    })?;

    let handle = runtime.handle().clone();
    let result = iced::application("Media Gallery", MediaGallery::update, MediaGallery::view)
        .theme(MediaGallery::theme)
        .subscription(MediaGallery::subscription)
        .centered()
        .run_with(move || MediaGallery::new(config, handle, transport));

    runtime.shutdown_background();
    result
}
