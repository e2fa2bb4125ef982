//! Debounced parsing of editor input
//!
//! Every keystroke reschedules a single pending parse. When the timer
//! fires the parse reads whatever the store holds at that moment, so a
//! result computed from stale text can never be dispatched.

use crate::loader::{CardDataSource, CardStore, DatabaseCache, LoadedDatabase};
use crate::logger::Logger;
use crate::session::pipeline::{parse_deck, MIN_PARSE_LENGTH};
use crate::session::state::{reduce, DeckAction, DeckState};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

const LOG_CATEGORY: &str = "parse";

/// Default quiet period before an edit is parsed
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub debounce: Duration,
    pub min_length: usize,
    pub enabled: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            debounce: DEFAULT_DEBOUNCE,
            min_length: MIN_PARSE_LENGTH,
            enabled: true,
        }
    }
}

/// Shared deck state; all changes go through `dispatch`
///
/// The store counts changes to the parse inputs (deck list and custom
/// commander URL). A parse result is only accepted while the count it was
/// read at is still current.
#[derive(Debug, Default)]
pub struct DeckStore {
    inner: Mutex<Revisioned>,
}

#[derive(Debug, Default)]
struct Revisioned {
    state: DeckState,
    revision: u64,
}

/// Parse inputs as read from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseInput {
    pub revision: u64,
    pub deck_list: String,
    pub custom_commander_url: String,
}

impl DeckStore {
    pub fn new(state: DeckState) -> Self {
        DeckStore {
            inner: Mutex::new(Revisioned { state, revision: 0 }),
        }
    }

    pub fn dispatch(&self, action: DeckAction) {
        let mut guard = self.lock();
        let current = std::mem::take(&mut guard.state);
        let deck_list = current.deck_list.clone();
        let commander_url = current.custom_commander_url.clone();
        let next = reduce(current, action);
        if next.deck_list != deck_list || next.custom_commander_url != commander_url {
            guard.revision += 1;
        }
        guard.state = next;
    }

    /// Dispatch only if the parse inputs have not changed since `revision`
    pub fn dispatch_if_current(&self, revision: u64, action: DeckAction) -> bool {
        let mut guard = self.lock();
        if guard.revision != revision {
            return false;
        }
        let current = std::mem::take(&mut guard.state);
        guard.state = reduce(current, action);
        true
    }

    /// Current parse inputs with their revision
    pub fn parse_input(&self) -> ParseInput {
        let guard = self.lock();
        ParseInput {
            revision: guard.revision,
            deck_list: guard.state.deck_list.clone(),
            custom_commander_url: guard.state.custom_commander_url.clone(),
        }
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Snapshot of the current state
    pub fn state(&self) -> DeckState {
        self.lock().state.clone()
    }

    /// Read the state without cloning it
    pub fn with_state<R>(&self, f: impl FnOnce(&DeckState) -> R) -> R {
        f(&self.lock().state)
    }

    fn lock(&self) -> MutexGuard<'_, Revisioned> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Anything that can hand out the current database snapshot
pub trait DatabaseProvider: Send + Sync + 'static {
    fn snapshot(&self) -> Option<Arc<LoadedDatabase>>;
}

impl<S, C> DatabaseProvider for DatabaseCache<S, C>
where
    S: CardDataSource,
    C: CardStore,
{
    fn snapshot(&self) -> Option<Arc<LoadedDatabase>> {
        DatabaseCache::snapshot(self)
    }
}

impl DatabaseProvider for Arc<LoadedDatabase> {
    fn snapshot(&self) -> Option<Arc<LoadedDatabase>> {
        Some(Arc::clone(self))
    }
}

/// Runs at most one delayed task; scheduling again cancels the pending one
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            pending: None,
        }
    }

    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Keeps the resolved deck in sync with the editor text
pub struct AutoParser<P> {
    store: Arc<DeckStore>,
    provider: Arc<P>,
    logger: Arc<Logger>,
    options: SessionOptions,
    debouncer: Debouncer,
}

impl<P: DatabaseProvider> AutoParser<P> {
    pub fn new(
        store: Arc<DeckStore>,
        provider: Arc<P>,
        logger: Arc<Logger>,
        options: SessionOptions,
    ) -> Self {
        AutoParser {
            store,
            provider,
            logger,
            debouncer: Debouncer::new(options.debounce),
            options,
        }
    }

    pub fn store(&self) -> &Arc<DeckStore> {
        &self.store
    }

    /// Record new editor text and schedule a parse
    pub fn on_input(&mut self, text: &str) {
        self.store.dispatch(DeckAction::SetDeckList(text.to_string()));
        self.schedule();
    }

    /// The custom commander is part of the parse output, so a change re-parses
    pub fn on_custom_commander_url(&mut self, url: &str) {
        self.store
            .dispatch(DeckAction::SetCustomCommanderUrl(url.to_string()));
        self.schedule();
    }

    /// Parse immediately, dropping any pending parse
    ///
    /// Returns whether a result was dispatched.
    pub fn parse_now(&mut self) -> bool {
        self.debouncer.cancel();
        run_parse(&self.store, self.provider.as_ref(), &self.logger, self.options)
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    fn schedule(&mut self) {
        if !self.options.enabled {
            return;
        }
        let store = Arc::clone(&self.store);
        let provider = Arc::clone(&self.provider);
        let logger = Arc::clone(&self.logger);
        let options = self.options;
        self.debouncer.schedule(async move {
            run_parse(&store, provider.as_ref(), &logger, options);
        });
    }
}

fn run_parse<P: DatabaseProvider>(
    store: &DeckStore,
    provider: &P,
    logger: &Logger,
    options: SessionOptions,
) -> bool {
    if !options.enabled {
        return false;
    }
    let Some(loaded) = provider.snapshot() else {
        logger.verbose(LOG_CATEGORY, "Card database not loaded yet; skipping parse");
        return false;
    };

    let input = store.parse_input();

    match parse_deck(
        &input.deck_list,
        &input.custom_commander_url,
        &loaded,
        options.min_length,
    ) {
        Ok(result) => {
            let summary = format!(
                "Parsed {} cards, {} extras, {} errors",
                result.cards.len(),
                result.extras.len(),
                result.error_cards.len()
            );
            if !store.dispatch_if_current(input.revision, DeckAction::ParseComplete(result)) {
                logger.verbose(LOG_CATEGORY, "Input changed during parse; dropping result");
                return false;
            }
            logger.verbose(LOG_CATEGORY, &summary);
            true
        }
        Err(e) => {
            logger.minimal(LOG_CATEGORY, &format!("Parse error: {e}"));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FatesealCard, Print, PrintImages};
    use crate::loader::CardDatabase;

    fn loaded() -> Arc<LoadedDatabase> {
        let mut db = CardDatabase::new();
        db.insert(FatesealCard {
            name: "Sol Ring".to_string(),
            prints: vec![Print {
                id: "sol".to_string(),
                set: "cmm".to_string(),
                collector_number: "410".to_string(),
                foil: false,
                etched: false,
                images: PrintImages::front("https://img/sol.jpg"),
                associated_cards: vec![],
            }],
        });
        Arc::new(LoadedDatabase::from_database(db, None))
    }

    fn parser(options: SessionOptions) -> (AutoParser<Arc<LoadedDatabase>>, Arc<Logger>) {
        let logger = Arc::new(Logger::capturing());
        let parser = AutoParser::new(
            Arc::new(DeckStore::default()),
            Arc::new(loaded()),
            Arc::clone(&logger),
            options,
        );
        (parser, logger)
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_input_is_parsed() {
        let (mut parser, _) = parser(SessionOptions::default());

        parser.on_input("1 So");
        tokio::time::sleep(Duration::from_millis(100)).await;
        parser.on_input("1 Sol Rin");
        tokio::time::sleep(Duration::from_millis(100)).await;
        parser.on_input("2 Sol Ring");
        assert!(parser.store().state().cards.is_empty());

        tokio::time::sleep(Duration::from_millis(399)).await;
        assert!(parser.store().state().cards.is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        let state = parser.store().state();
        assert_eq!(state.deck_list, "2 Sol Ring");
        assert_eq!(state.card_count(), 2);
        assert_eq!(state.error_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parse_error_leaves_state() {
        let (mut parser, logger) = parser(SessionOptions::default());

        parser.on_input("1 Sol Ring");
        assert!(parser.parse_now());
        assert_eq!(parser.store().state().card_count(), 1);

        parser.on_input("0 Sol Ring");
        tokio::time::sleep(Duration::from_millis(500)).await;

        let state = parser.store().state();
        assert_eq!(state.deck_list, "0 Sol Ring");
        assert_eq!(state.card_count(), 1);
        assert!(logger.contains("Parse error"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_parser_does_nothing() {
        let (mut parser, _) = parser(SessionOptions {
            enabled: false,
            ..Default::default()
        });

        parser.on_input("1 Sol Ring");
        assert!(!parser.is_pending());
        assert!(!parser.parse_now());
        assert!(parser.store().state().cards.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commander_change_reparses() {
        let (mut parser, _) = parser(SessionOptions::default());

        parser.on_input("1 Sol Ring");
        parser.on_custom_commander_url("https://cmd.png");
        tokio::time::sleep(Duration::from_millis(401)).await;

        let state = parser.store().state();
        assert_eq!(state.card_count(), 2);
        assert_eq!(state.cards[0].images.front, "https://cmd.png");
    }

    #[tokio::test]
    async fn test_debouncer_cancel() {
        let mut debouncer = Debouncer::new(Duration::from_secs(60));
        debouncer.schedule(async {});
        assert!(debouncer.is_pending());
        debouncer.cancel();
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_parse_result_is_dropped() {
        let (mut parser, _) = parser(SessionOptions::default());
        let db = loaded();

        // A slow parse of the long list reads its input first
        parser.on_input("1 Sol Ring\n1 Sol Ring\n1 Sol Ring");
        let stale_input = parser.store().parse_input();
        let stale = parse_deck(&stale_input.deck_list, "", &db, MIN_PARSE_LENGTH).unwrap();

        // Meanwhile the user edits and forces a parse
        parser.on_input("1 Sol Ring");
        assert!(parser.parse_now());
        assert_eq!(parser.store().state().card_count(), 1);

        // The slow parse finishes last
        let accepted = parser
            .store()
            .dispatch_if_current(stale_input.revision, DeckAction::ParseComplete(stale));
        assert!(!accepted);

        let state = parser.store().state();
        assert_eq!(state.deck_list, "1 Sol Ring");
        assert_eq!(state.card_count(), 1);
        assert!(!parser.is_pending());
    }

    #[test]
    fn test_revision_tracks_parse_inputs() {
        let store = DeckStore::default();
        assert_eq!(store.revision(), 0);

        store.dispatch(DeckAction::SetDeckName("Burn".to_string()));
        store.dispatch(DeckAction::SetCustomBackUrl("https://back.png".to_string()));
        assert_eq!(store.revision(), 0);

        store.dispatch(DeckAction::SetDeckList("1 Sol Ring".to_string()));
        assert_eq!(store.revision(), 1);
        store.dispatch(DeckAction::SetDeckList("1 Sol Ring".to_string()));
        assert_eq!(store.revision(), 1);

        store.dispatch(DeckAction::SetCustomCommanderUrl("https://cmd.png".to_string()));
        assert_eq!(store.revision(), 2);

        let input = store.parse_input();
        assert_eq!(input.revision, 2);
        assert_eq!(input.deck_list, "1 Sol Ring");
        assert_eq!(input.custom_commander_url, "https://cmd.png");
    }

    #[test]
    fn test_store_dispatch() {
        let store = DeckStore::default();
        store.dispatch(DeckAction::SetDeckName("Burn".to_string()));
        assert_eq!(store.with_state(|s| s.deck_name.clone()), "Burn");
    }
}
