use crate::achievements::{newly_unlocked, Achievement};
use crate::clock::{Clock, MonotonicClock};
use crate::corpus::{
    CorpusGenerator, Difficulty, GenerationRequest, Language, Mode, MAX_DURATION_SECS,
};
use crate::loader::{Extension, ExtensionLoader};
use crate::notify::{LogNotifier, Notification, Notifier};
use crate::persistence::{MemoryStore, Persistence, TestRecord};
use crate::session::{Countdown, LifecycleState, TestSession};
use crate::stats::{compute_stats, Stats, TestResult};
use crate::telemetry::{TelemetryBatch, TelemetryRecorder};
use crate::time_series::WpmSample;
use crate::typing_policy::diff_input;
use crate::util::take_chars;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// A timed typing exercise.
///
/// Owns the session and every piece of per-session state: countdown, text
/// loader, telemetry buffers. All methods take `&mut self`, so a host drives
/// it from a single loop: feed input with [`TypingTest::set_input`] and call
/// [`TypingTest::on_tick`] regularly.
pub struct TypingTest {
    session: TestSession,
    request: GenerationRequest,
    generator: CorpusGenerator,
    loader: ExtensionLoader,
    telemetry: TelemetryRecorder,
    countdown: Option<Countdown>,
    clock: Arc<dyn Clock>,
    persistence: Box<dyn Persistence>,
    notifier: Box<dyn Notifier>,
    live: Stats,
    wpm_history: Vec<WpmSample>,
    result: Option<TestResult>,
    new_achievements: Vec<Achievement>,
}

impl TypingTest {
    /// Idle test with production collaborators and no prompt loaded yet
    pub fn new(request: GenerationRequest) -> Self {
        Self {
            session: TestSession::new(request.duration_secs),
            request,
            generator: CorpusGenerator::new(),
            loader: ExtensionLoader::new(),
            telemetry: TelemetryRecorder::new(),
            countdown: None,
            clock: Arc::new(MonotonicClock::new()),
            persistence: Box::new(MemoryStore::new()),
            notifier: Box::new(LogNotifier),
            live: Stats::default(),
            wpm_history: Vec::new(),
            result: None,
            new_achievements: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_generator(mut self, generator: CorpusGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_persistence(mut self, persistence: impl Persistence + 'static) -> Self {
        self.persistence = Box::new(persistence);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    // ---- lifecycle ----

    /// Arm the session. The timer waits for the first typed character.
    pub fn start(&mut self) {
        match self.session.state {
            LifecycleState::Idle => {
                if self.session.reference.is_empty() {
                    self.load_prompt();
                }
            }
            LifecycleState::Completed => self.load_prompt(),
            LifecycleState::Ready | LifecycleState::Running => {
                tracing::debug!(state = %self.session.state, "start ignored");
                return;
            }
        }

        self.clear_progress();
        self.session.state = LifecycleState::Ready;
        tracing::debug!(reference_len = self.session.reference_len(), "session ready");
    }

    /// Back to `Idle` with a fresh prompt, from any state
    pub fn reset(&mut self) {
        self.clear_progress();
        self.session.state = LifecycleState::Idle;
        self.load_prompt();
    }

    pub fn request_new_prompt(&mut self) {
        self.reset();
    }

    /// End a running test early, timing it by the wall clock
    pub fn finish(&mut self) {
        if self.session.state != LifecycleState::Running {
            return;
        }
        let time_taken = self.session.wall_elapsed_secs(self.clock.now());
        self.complete(time_taken);
    }

    /// Replace the typed text with the full current input value
    pub fn set_input(&mut self, input: &str) {
        let state = self.session.state;
        if !matches!(state, LifecycleState::Ready | LifecycleState::Running) {
            return;
        }

        let input = take_chars(input, self.session.reference_len());
        let change = diff_input(&self.session.typed, input);
        if change.is_noop() {
            return;
        }

        let now = self.clock.now();
        if state == LifecycleState::Ready {
            if change.is_deletion_only() {
                return;
            }
            self.begin_running(now);
        }

        if let Some(&(first, _)) = change.appended.first() {
            // a paste or batched edit has no per-key timing
            let timed = change.appended.len() == 1;
            let expected = self.session.reference.chars().skip(first);
            for (&(index, typed), expected) in change.appended.iter().zip(expected) {
                if timed {
                    self.telemetry.record(now, index, typed, expected);
                } else {
                    self.telemetry.record_untimed(now, index, typed, expected);
                }
                if typed != expected {
                    self.notifier.notify(Notification::KeypressError);
                }
            }
        }

        self.session.typed = input.to_string();
        self.live = compute_stats(
            &self.session.typed,
            &self.session.reference,
            self.session.elapsed_secs,
        );
        self.pump_extension();
    }

    pub fn type_char(&mut self, c: char) {
        let mut input = self.session.typed.clone();
        input.push(c);
        self.set_input(&input);
    }

    pub fn backspace(&mut self) {
        let mut input = self.session.typed.clone();
        if input.pop().is_some() {
            self.set_input(&input);
        }
    }

    /// Advance the countdown to the current clock time
    pub fn on_tick(&mut self) {
        if self.session.state != LifecycleState::Running {
            return;
        }
        let now = self.clock.now();

        if let Some(text) = self.loader.poll() {
            self.session.extend_reference(&text);
        }

        let due = self.countdown.as_mut().map_or(0, |c| c.advance(now));
        for _ in 0..due {
            self.session.elapsed_secs += 1.0;
            self.live = compute_stats(
                &self.session.typed,
                &self.session.reference,
                self.session.elapsed_secs,
            );
            self.wpm_history.push(WpmSample::new(
                self.session.elapsed_secs as u32,
                self.live.wpm,
                self.live.net_wpm,
            ));
        }

        if self.countdown.is_some_and(|c| c.is_done()) {
            self.complete(self.session.total_secs as f64);
            return;
        }

        if let Some(batch) = self.telemetry.take_due(now) {
            self.flush_telemetry(&batch);
        }
    }

    /// Block up to `timeout` for a pending extension. Returns whether text was appended.
    pub fn wait_for_extension(&mut self, timeout: Duration) -> bool {
        match self.loader.wait(timeout) {
            Some(text) if self.session.state == LifecycleState::Running => {
                self.session.extend_reference(&text);
                true
            }
            _ => false,
        }
    }

    // ---- settings ----

    pub fn change_difficulty(&mut self, difficulty: Difficulty) {
        self.request.difficulty = difficulty;
        self.reset();
    }

    pub fn change_mode(&mut self, mode: Mode) {
        self.request.mode = mode;
        self.reset();
    }

    pub fn change_language(&mut self, language: Language) {
        self.request.language = language;
        self.reset();
    }

    /// Use `text` as the prompt. Switches to custom difficulty.
    pub fn set_custom_text(&mut self, text: impl Into<String>) {
        self.request.custom_text = Some(text.into());
        self.request.difficulty = Difficulty::Custom;
        self.reset();
    }

    /// Clamped to 1..=MAX_DURATION_SECS
    pub fn set_duration(&mut self, secs: u32) {
        self.request.duration_secs = secs.clamp(1, MAX_DURATION_SECS);
        self.reset();
    }

    // ---- accessors ----

    pub fn session(&self) -> &TestSession {
        &self.session
    }

    pub fn state(&self) -> LifecycleState {
        self.session.state
    }

    pub fn is_running(&self) -> bool {
        self.session.state == LifecycleState::Running
    }

    pub fn is_completed(&self) -> bool {
        self.session.state == LifecycleState::Completed
    }

    pub fn reference(&self) -> &str {
        &self.session.reference
    }

    pub fn typed(&self) -> &str {
        &self.session.typed
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.session.elapsed_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.session.total_secs
    }

    pub fn remaining_secs(&self) -> f64 {
        self.session.remaining_secs()
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    /// Metrics as of the last input or tick
    pub fn live_stats(&self) -> Stats {
        self.live
    }

    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    pub fn wpm_history(&self) -> &[WpmSample] {
        &self.wpm_history
    }

    /// Achievements the last completed test unlocked
    pub fn new_achievements(&self) -> &[Achievement] {
        &self.new_achievements
    }

    pub fn extension_in_flight(&self) -> bool {
        self.loader.in_flight()
    }

    pub fn extension_requests(&self) -> usize {
        self.loader.requests_issued()
    }

    /// Telemetry buffered since the last flush
    pub fn pending_telemetry(&self) -> &TelemetryBatch {
        self.telemetry.pending()
    }

    // ---- internals ----

    fn load_prompt(&mut self) {
        self.session.reference = self.generator.generate(&self.request);
    }

    /// Drop everything a session accumulates, keeping the prompt
    fn clear_progress(&mut self) {
        self.countdown = None;
        self.loader.cancel();
        self.telemetry.clear();

        let reference = std::mem::take(&mut self.session.reference);
        self.session = TestSession::new(self.request.duration_secs);
        self.session.reference = reference;

        self.live = Stats::default();
        self.wpm_history.clear();
        self.result = None;
        self.new_achievements.clear();
    }

    fn begin_running(&mut self, now: Duration) {
        self.session.state = LifecycleState::Running;
        self.session.started_at = Some(now);
        self.countdown = Some(Countdown::new(now, self.session.total_secs));
        self.telemetry.begin(now);
        self.notifier.notify(Notification::Start);
        tracing::debug!(total_secs = self.session.total_secs, "session running");
    }

    fn pump_extension(&mut self) {
        if self.session.state != LifecycleState::Running {
            return;
        }
        if let Some(text) = self.loader.poll() {
            self.session.extend_reference(&text);
        }

        let outcome = self
            .loader
            .check(&self.session, &self.request, &mut self.generator);
        match outcome {
            Extension::Ready(text) => self.session.extend_reference(&text),
            Extension::Requested(trigger) => tracing::debug!(?trigger, "extension requested"),
            Extension::Idle => {}
        }
    }

    fn complete(&mut self, time_taken: f64) {
        self.countdown = None;
        self.loader.cancel();
        self.session.state = LifecycleState::Completed;
        self.session.elapsed_secs = time_taken;

        let stats = compute_stats(&self.session.typed, &self.session.reference, time_taken);
        self.live = stats;
        let result = TestResult::from_stats(stats, time_taken, Utc::now());
        self.notifier.notify(Notification::End);
        tracing::info!(
            wpm = result.wpm,
            net_wpm = result.net_wpm,
            accuracy = result.accuracy,
            time_taken,
            "test completed"
        );

        if let Some(batch) = self.telemetry.drain() {
            self.flush_telemetry(&batch);
        }
        let trace = self.telemetry.take_trace();
        if trace.worth_saving(time_taken) {
            if let Err(e) = self.persistence.save_ghost_replay(&trace) {
                tracing::warn!(error = %e, "failed to save ghost replay");
            }
        } else {
            tracing::debug!(entries = trace.len(), time_taken, "replay too short to keep");
        }
        self.telemetry.clear();

        let record = TestRecord {
            result: result.clone(),
            difficulty: self.request.difficulty,
            mode: self.request.mode,
            language: self.request.language,
            duration_secs: self.session.total_secs,
        };
        self.new_achievements = self.persist(&record);
        self.result = Some(result);
    }

    fn persist(&self, record: &TestRecord) -> Vec<Achievement> {
        let before = self.achievements();
        let saved = self.persistence.add_test_result(record);
        if let Err(e) = &saved {
            tracing::warn!(error = %e, "failed to save test result");
        }
        if let Err(e) = self.persistence.update_personal_bests(record) {
            tracing::warn!(error = %e, "failed to update personal bests");
        }
        if let Err(e) = self.persistence.update_performance_by_type(record) {
            tracing::warn!(error = %e, "failed to update per-type performance");
        }
        match saved {
            Ok(()) => newly_unlocked(&before, self.achievements()),
            Err(_) => Vec::new(),
        }
    }

    fn achievements(&self) -> Vec<Achievement> {
        self.persistence.get_achievements().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load achievements");
            Vec::new()
        })
    }

    fn flush_telemetry(&self, batch: &TelemetryBatch) {
        if let Err(e) = self.persistence.batch_update_key_stats(batch) {
            tracing::warn!(error = %e, events = batch.len(), "dropping keystroke telemetry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::PersistenceError;
    use crate::telemetry::ReplayTrace;
    use parking_lot::Mutex;

    struct Harness {
        test: TypingTest,
        clock: ManualClock,
        store: MemoryStore,
        notifications: Arc<Mutex<Vec<Notification>>>,
    }

    fn harness(request: GenerationRequest) -> Harness {
        let clock = ManualClock::new();
        let store = MemoryStore::new();
        let notifications = Arc::new(Mutex::new(Vec::new()));
        let sink = notifications.clone();
        let test = TypingTest::new(request)
            .with_clock(Arc::new(clock.clone()))
            .with_generator(CorpusGenerator::seeded(7))
            .with_persistence(store.clone())
            .with_notifier(move |n: Notification| sink.lock().push(n));
        Harness {
            test,
            clock,
            store,
            notifications,
        }
    }

    fn custom(text: &str, secs: u32) -> GenerationRequest {
        GenerationRequest::new(Difficulty::Custom, Mode::Words, Language::English, secs)
            .with_custom_text(text)
    }

    #[test]
    fn starts_idle_without_prompt() {
        let h = harness(GenerationRequest::default());
        assert_eq!(h.test.state(), LifecycleState::Idle);
        assert!(h.test.reference().is_empty());
    }

    #[test]
    fn start_arms_without_timer() {
        let mut h = harness(custom("hello world", 30));
        h.test.start();
        assert_eq!(h.test.state(), LifecycleState::Ready);
        assert_eq!(h.test.reference(), "hello world");

        h.clock.advance_secs(5);
        h.test.on_tick();
        assert_eq!(h.test.elapsed_secs(), 0.0);
        assert_eq!(h.test.state(), LifecycleState::Ready);
    }

    #[test]
    fn first_character_starts_running() {
        let mut h = harness(custom("hello world", 30));
        h.test.start();
        h.test.type_char('h');

        assert!(h.test.is_running());
        assert_eq!(h.test.session().started_at, Some(Duration::ZERO));
        assert_eq!(*h.notifications.lock(), vec![Notification::Start]);
    }

    #[test]
    fn input_ignored_when_idle_or_completed() {
        let mut h = harness(custom("abc", 30));
        h.test.set_input("a");
        assert_eq!(h.test.typed(), "");

        h.test.start();
        h.test.set_input("a");
        h.test.finish();
        assert!(h.test.is_completed());
        h.test.set_input("ab");
        assert_eq!(h.test.typed(), "a");
    }

    #[test]
    fn mismatch_notifies_keypress_error() {
        let mut h = harness(custom("abc", 30));
        h.test.start();
        h.test.set_input("ax");

        assert_eq!(
            *h.notifications.lock(),
            vec![Notification::Start, Notification::KeypressError]
        );
        assert_eq!(h.test.live_stats().errors, 1);
    }

    #[test]
    fn deletions_are_not_keystrokes() {
        let mut h = harness(custom("abcdef", 30));
        h.test.start();
        h.test.type_char('a');
        h.clock.advance_ms(100);
        h.test.type_char('b');
        h.clock.advance_ms(100);
        h.test.backspace();

        assert_eq!(h.test.typed(), "a");
        assert_eq!(h.test.pending_telemetry().len(), 1);
    }

    #[test]
    fn pasted_text_yields_no_latency_samples() {
        let mut h = harness(custom("hello world", 30));
        h.test.start();
        h.test.type_char('h');
        h.clock.advance_ms(300);
        h.test.set_input("hello");
        assert!(h.test.pending_telemetry().is_empty());

        h.clock.advance_ms(120);
        h.test.type_char(' ');
        let events = &h.test.pending_telemetry().events;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].latency_ms, 120);
    }

    #[test]
    fn input_is_truncated_to_reference() {
        let mut h = harness(custom("abc", 30));
        h.test.start();
        h.test.set_input("abcdef");
        assert_eq!(h.test.typed(), "abc");
    }

    #[test]
    fn countdown_completes_with_configured_duration() {
        let mut h = harness(custom("the quick brown fox", 3));
        h.test.start();
        h.test.set_input("the");

        for _ in 0..3 {
            h.clock.advance_ms(1000);
            h.test.on_tick();
        }

        assert!(h.test.is_completed());
        let result = h.test.result().unwrap();
        assert_eq!(result.time_taken, 3.0);
        assert_eq!(h.test.wpm_history().len(), 3);
        assert_eq!(h.notifications.lock().last(), Some(&Notification::End));
        assert_eq!(h.store.results().len(), 1);
    }

    #[test]
    fn ticks_follow_the_clock_not_the_call_count() {
        let mut h = harness(custom("steady rhythm", 10));
        h.test.start();
        h.test.type_char('s');

        for _ in 0..20 {
            h.clock.advance_ms(100);
            h.test.on_tick();
        }
        assert_eq!(h.test.elapsed_secs(), 2.0);
        assert_eq!(h.test.remaining_secs(), 8.0);
    }

    #[test]
    fn finish_uses_wall_clock_time() {
        let mut h = harness(custom("hello world", 60));
        h.test.start();
        h.test.set_input("hello");
        h.clock.advance_ms(2500);
        h.test.finish();

        assert!(h.test.is_completed());
        assert_eq!(h.test.result().unwrap().time_taken, 2.5);
        assert_eq!(h.test.elapsed_secs(), 2.5);
    }

    #[test]
    fn finish_outside_running_does_nothing() {
        let mut h = harness(custom("hello", 60));
        h.test.finish();
        h.test.start();
        h.test.finish();
        assert_eq!(h.test.state(), LifecycleState::Ready);
        assert!(h.test.result().is_none());
    }

    #[test]
    fn reset_stops_the_countdown() {
        let mut h = harness(custom("hello world", 5));
        h.test.start();
        h.test.set_input("hel");
        h.clock.advance_secs(1);
        h.test.on_tick();
        h.test.reset();

        assert_eq!(h.test.state(), LifecycleState::Idle);
        assert_eq!(h.test.typed(), "");
        h.clock.advance_secs(10);
        h.test.on_tick();
        assert_eq!(h.test.elapsed_secs(), 0.0);
        assert!(h.test.result().is_none());
        assert!(h.store.results().is_empty());
    }

    #[test]
    fn start_after_completion_loads_fresh_prompt() {
        let mut h = harness(GenerationRequest::new(
            Difficulty::Easy,
            Mode::Words,
            Language::English,
            15,
        ));
        h.test.start();
        let first = h.test.reference().to_string();
        h.test.type_char(first.chars().next().unwrap());
        h.test.finish();

        h.test.start();
        assert_eq!(h.test.state(), LifecycleState::Ready);
        assert_ne!(h.test.reference(), first);
        assert!(h.test.result().is_none());
        assert_eq!(h.test.typed(), "");
    }

    #[test]
    fn custom_text_extends_by_reappending() {
        let mut h = harness(custom("go", 60));
        h.test.start();
        h.test.set_input("go");

        assert_eq!(h.test.reference(), "go go");
        assert!(!h.test.extension_in_flight());
    }

    #[test]
    fn crossing_half_issues_one_request() {
        let mut h = harness(GenerationRequest::new(
            Difficulty::Easy,
            Mode::Words,
            Language::English,
            15,
        ));
        h.test.start();
        let reference: String = h.test.reference().to_string();
        let len = reference.chars().count();
        let past_half: String = reference.chars().take(len / 2 + 1).collect();

        h.test.set_input(&past_half);
        assert!(h.test.extension_in_flight());
        assert_eq!(h.test.extension_requests(), 1);

        assert!(h.test.wait_for_extension(Duration::from_secs(5)));
        assert!(h.test.reference().starts_with(&reference));
        assert!(h.test.reference().chars().count() > len);
        assert!(!h.test.extension_in_flight());
    }

    #[test]
    fn settings_changes_reset_with_new_request() {
        let mut h = harness(GenerationRequest::default());
        h.test.start();
        h.test.change_mode(Mode::Numbers);
        assert_eq!(h.test.state(), LifecycleState::Idle);
        assert_eq!(h.test.request().mode, Mode::Numbers);
        assert!(!h.test.reference().is_empty());

        h.test.set_custom_text("my own words");
        assert_eq!(h.test.request().difficulty, Difficulty::Custom);
        assert_eq!(h.test.reference(), "my own words");

        h.test.set_duration(0);
        assert_eq!(h.test.total_secs(), 1);

        h.test.change_difficulty(Difficulty::Medium);
        h.test.set_duration(u32::MAX);
        assert_eq!(h.test.total_secs(), MAX_DURATION_SECS);
        assert!(!h.test.reference().is_empty());

        h.test.change_language(Language::Spanish);
        h.test.change_difficulty(Difficulty::Hard);
        assert_eq!(h.test.request().language, Language::Spanish);
        assert_eq!(h.test.request().difficulty, Difficulty::Hard);
    }

    #[test]
    fn telemetry_flushes_every_five_seconds() {
        let mut h = harness(custom("abcdefghij", 30));
        h.test.start();
        h.test.type_char('a');
        h.clock.advance_ms(150);
        h.test.type_char('b');
        h.clock.advance_ms(150);
        h.test.type_char('c');

        h.clock.advance_ms(4700);
        h.test.on_tick();
        assert_eq!(h.store.key_flushes(), 1);
        assert_eq!(h.store.key_events().len(), 2);
        assert!(h.test.pending_telemetry().is_empty());
    }

    #[test]
    fn completion_reports_new_achievements_once() {
        let mut h = harness(custom("hello world", 30));
        h.test.start();
        h.test.set_input("hello");
        h.clock.advance_secs(10);
        h.test.finish();
        let ids: Vec<&str> = h.test.new_achievements().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first_test"]);

        h.test.start();
        h.test.set_input("hello");
        h.clock.advance_secs(10);
        h.test.finish();
        assert!(h.test.new_achievements().is_empty());
        assert_eq!(h.store.results().len(), 2);
    }

    struct BrokenStore;

    impl Persistence for BrokenStore {
        fn add_test_result(&self, _: &TestRecord) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable("offline".into()))
        }
        fn update_personal_bests(&self, _: &TestRecord) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable("offline".into()))
        }
        fn update_performance_by_type(&self, _: &TestRecord) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable("offline".into()))
        }
        fn batch_update_key_stats(&self, _: &TelemetryBatch) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable("offline".into()))
        }
        fn save_ghost_replay(&self, _: &ReplayTrace) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable("offline".into()))
        }
        fn get_achievements(&self) -> Result<Vec<Achievement>, PersistenceError> {
            Err(PersistenceError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn persistence_failures_do_not_break_the_test() {
        let clock = ManualClock::new();
        let mut test = TypingTest::new(custom("abc def", 10))
            .with_clock(Arc::new(clock.clone()))
            .with_persistence(BrokenStore);
        test.start();
        test.set_input("abc");
        clock.advance_secs(6);
        test.on_tick();
        test.finish();

        assert!(test.is_completed());
        assert!(test.result().is_some());
        assert!(test.new_achievements().is_empty());
    }

    /// Memory store that refuses to save results but accepts everything else
    struct ResultsRejected(MemoryStore);

    impl Persistence for ResultsRejected {
        fn add_test_result(&self, _: &TestRecord) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable("results table locked".into()))
        }
        fn update_personal_bests(&self, record: &TestRecord) -> Result<(), PersistenceError> {
            self.0.update_personal_bests(record)
        }
        fn update_performance_by_type(&self, record: &TestRecord) -> Result<(), PersistenceError> {
            self.0.update_performance_by_type(record)
        }
        fn batch_update_key_stats(&self, batch: &TelemetryBatch) -> Result<(), PersistenceError> {
            self.0.batch_update_key_stats(batch)
        }
        fn save_ghost_replay(&self, trace: &ReplayTrace) -> Result<(), PersistenceError> {
            self.0.save_ghost_replay(trace)
        }
        fn get_achievements(&self) -> Result<Vec<Achievement>, PersistenceError> {
            self.0.get_achievements()
        }
    }

    #[test]
    fn failed_result_save_still_updates_bests_and_types() {
        let clock = ManualClock::new();
        let store = MemoryStore::new();
        let mut test = TypingTest::new(custom("abc def ghi", 5))
            .with_clock(Arc::new(clock.clone()))
            .with_persistence(ResultsRejected(store.clone()));
        test.start();
        test.set_input("abc d");
        clock.advance_secs(5);
        test.on_tick();

        assert!(test.is_completed());
        assert!(test.new_achievements().is_empty());
        assert!(store.results().is_empty());
        assert!(store.personal_best(Mode::Words, 5).is_some());
        assert!(store.performance(Mode::Words, Difficulty::Custom).is_some());
    }
}
