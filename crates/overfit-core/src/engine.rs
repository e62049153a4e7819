//! Game engine: one seeded session wrapped around the pure rules.

use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use overfit_logic::archetypes::Archetype;
use overfit_logic::difficulty::Difficulty;
use overfit_logic::ending::{resolve_ending, EndingSummary};
use overfit_logic::exam::ExamResult;
use overfit_logic::log::{LogEntry, LogKind};
use overfit_logic::operations::{self, OperationId, Target, Transition};
use overfit_logic::state::{create_game, GameState};
use overfit_logic::tables::GameTables;
use overfit_logic::team::refresh_hiring_pool;
use overfit_logic::turn;
use overfit_logic::EngineError;

use crate::persistence::{self, SaveError};

/// Session setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub archetype: Archetype,
    pub difficulty: Difficulty,
    /// Fixed seed for replays; drawn from entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            archetype: Archetype::Startup,
            difficulty: Difficulty::Normal,
            seed: None,
        }
    }
}

/// Main game engine
pub struct GameEngine {
    state: GameState,
    tables: GameTables,
    rng: SmallRng,
    seed: u64,
    config: SessionConfig,
    history: Vec<LogEntry>,
    exams: Vec<ExamResult>,
    next_timestamp: u64,
}

impl GameEngine {
    /// Start a session on the standard tables.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_tables(config, GameTables::standard())
    }

    /// Start a session on custom tables.
    pub fn with_tables(config: SessionConfig, tables: GameTables) -> Self {
        let seed = config.seed.unwrap_or_else(|| SmallRng::from_entropy().gen());
        let mut rng = SmallRng::seed_from_u64(seed);
        let state = Self::fresh_state(&config, &tables, &mut rng);
        info!(
            "new session: {} / {} (seed {})",
            config.archetype.id(),
            config.difficulty.id(),
            seed
        );
        let mut engine = Self {
            state,
            tables,
            rng,
            seed,
            config,
            history: Vec::new(),
            exams: Vec::new(),
            next_timestamp: 0,
        };
        engine.record_system("New game started.");
        engine
    }

    fn fresh_state(config: &SessionConfig, tables: &GameTables, rng: &mut SmallRng) -> GameState {
        let mut state = create_game(config.archetype, config.difficulty, tables);
        refresh_hiring_pool(&mut state, tables, rng);
        state
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tables(&self) -> &GameTables {
        &self.tables
    }

    /// Seed the session RNG was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Every log entry recorded this session, oldest first.
    pub fn history(&self) -> &[LogEntry] {
        &self.history
    }

    /// Every exam run this session, oldest first.
    pub fn exam_history(&self) -> &[ExamResult] {
        &self.exams
    }

    /// Score, grade and title once the game has ended.
    pub fn ending(&self) -> Option<EndingSummary> {
        resolve_ending(&self.state)
    }

    pub fn available_operations(&self) -> Vec<OperationId> {
        operations::eligible_operations(&self.state, &self.tables)
    }

    pub fn can_execute(&self, id: OperationId, target: Option<Target>) -> bool {
        operations::can_execute(&self.state, &self.tables, id, target)
    }

    /// Apply a player operation. Returns the entries it logged.
    pub fn apply(&mut self, id: OperationId, target: Option<Target>) -> Result<Vec<LogEntry>, EngineError> {
        let transition = operations::apply_operation(&self.state, &self.tables, id, target, &mut self.rng)?;
        Ok(self.commit(transition))
    }

    /// Close the current turn. Returns the entries it logged.
    pub fn end_turn(&mut self) -> Result<Vec<LogEntry>, EngineError> {
        let transition = turn::end_turn(&self.state, &self.tables, &mut self.rng)?;
        Ok(self.commit(transition))
    }

    /// Throw the current game away and start over with the same setup.
    pub fn restart(&mut self) {
        self.state = Self::fresh_state(&self.config, &self.tables, &mut self.rng);
        self.history.clear();
        self.exams.clear();
        self.record_system("New game started.");
    }

    fn commit(&mut self, transition: Transition) -> Vec<LogEntry> {
        self.state = transition.state;
        if let Some(exam) = transition.exam {
            self.exams.push(exam);
        }
        let stamped = self.stamp(transition.log);
        if let Some(summary) = self.ending() {
            info!(
                "game ended: {} score {} grade {}",
                summary.ending_type.id(),
                summary.score,
                summary.grade.label()
            );
        }
        stamped
    }

    fn stamp(&mut self, entries: Vec<LogEntry>) -> Vec<LogEntry> {
        let stamped: Vec<LogEntry> = entries
            .into_iter()
            .map(|mut entry| {
                entry.timestamp = self.next_timestamp;
                self.next_timestamp += 1;
                entry
            })
            .collect();
        self.history.extend(stamped.iter().cloned());
        stamped
    }

    fn record_system(&mut self, message: &str) {
        let entry = LogEntry::new(LogKind::System, self.state.progress.turn, message);
        self.stamp(vec![entry]);
    }

    // ── Persistence ────────────────────────────────────────────────

    /// Serialize the current state to a JSON save.
    pub fn save_json(&self) -> Result<String, SaveError> {
        persistence::serialize_state(&self.state)
    }

    /// Replace the current game with a JSON save. On error nothing changes.
    pub fn load_json(&mut self, json: &str) -> Result<(), SaveError> {
        let state = persistence::deserialize_state(json)?;
        self.adopt(state);
        Ok(())
    }

    /// Save a binary snapshot to a writer
    pub fn save_binary<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_binary(writer, &self.state)
    }

    /// Load a binary snapshot from a reader
    pub fn load_binary<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let state = persistence::load_binary(reader)?;
        self.adopt(state);
        Ok(())
    }

    fn adopt(&mut self, state: GameState) {
        self.config.archetype = state.archetype;
        self.config.difficulty = state.difficulty;
        self.state = state;
        self.history.clear();
        self.exams.clear();
        self.record_system("Save loaded.");
    }
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
