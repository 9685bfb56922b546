//! One version store per record type, built once at process start
//!
//! Handlers receive a `&Ledger` (or an `Arc<Ledger>`) instead of reaching for
//! global collections. Demo data is a constructor argument.
use super::config::AppConfig;
use super::error::StoreResult;
use super::interval::{SharedClock, TimeStamp};
use super::journal::Change;
use super::models::{Balance, Cashback, ExpectedIncome, Expense, Goal, Income};
use super::record::{EntityId, Record, Version};
use super::store::VersionStore;
use chrono::Months;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RecordKind {
    Income,
    IncomeExpected,
    Expense,
    Goal,
    Cashback,
    Balance,
}

pub struct Ledger {
    pub incomes: VersionStore<Income>,
    pub expected_incomes: VersionStore<ExpectedIncome>,
    pub expenses: VersionStore<Expense>,
    pub goals: VersionStore<Goal>,
    pub cashbacks: VersionStore<Cashback>,
    pub balances: VersionStore<Balance>,
}

/// Initial versions for every store.
#[derive(Debug, Default, Clone)]
pub struct Seed {
    pub incomes: Vec<Version<Income>>,
    pub expected_incomes: Vec<Version<ExpectedIncome>>,
    pub expenses: Vec<Version<Expense>>,
    pub goals: Vec<Version<Goal>>,
    pub cashbacks: Vec<Version<Cashback>>,
    pub balances: Vec<Version<Balance>>,
}

impl Seed {
    /// Two current versions per record type, effective from `now`.
    pub fn demo(now: TimeStamp, actor: &str) -> Self {
        let from = now;
        let in_months = |months: u32| {
            now.to_datetime_utc()
                .checked_add_months(Months::new(months))
                .map(TimeStamp::from)
                .unwrap_or(now)
        };

        Self {
            incomes: vec![
                Version::open(
                    Income::new(1, 1, "Salary")
                        .set_amount(10_050)
                        .set_expected(1, 15_000)
                        .set_received_on(1, 15),
                    actor,
                    from,
                ),
                Version::open(
                    Income::new(2, 2, "Freelance")
                        .set_amount(5_050)
                        .set_expected(2, 7_500)
                        .set_received_on(1, 20),
                    actor,
                    from,
                ),
            ],
            expected_incomes: vec![
                Version::open(ExpectedIncome::new(1, 1, 15_000, "Salary", 15), actor, from),
                Version::open(ExpectedIncome::new(2, 2, 7_500, "Bonus", 20), actor, from),
            ],
            expenses: vec![
                Version::open(
                    Expense::new(1, "Utilities", "Electricity Bill", 10_000, now)
                        .set_description("Monthly electricity bill payment")
                        .set_recurring(true),
                    actor,
                    from,
                ),
                Version::open(
                    Expense::new(2, "Groceries", "Weekly Groceries", 5_000, now)
                        .set_description("Weekly grocery shopping"),
                    actor,
                    from,
                ),
            ],
            goals: vec![
                Version::open(Goal::new(1, 1, 100_000, in_months(1)), actor, from),
                Version::open(Goal::new(2, 2, 50_000, in_months(2)), actor, from),
            ],
            cashbacks: vec![
                Version::open(Cashback::new(1, 1, "Bank A", "Groceries", 5), actor, from),
                Version::open(Cashback::new(2, 2, "Bank B", "Dining", 10), actor, from),
            ],
            balances: vec![
                Version::open(
                    Balance::new(1, 1, 130_075).apply(1, "Deposit", 20_000),
                    actor,
                    from,
                ),
                Version::open(
                    Balance::new(2, 2, 85_050).apply(2, "Withdrawal", -10_000),
                    actor,
                    from,
                ),
            ],
        }
    }
}

impl Ledger {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            incomes: VersionStore::new(clock.clone()),
            expected_incomes: VersionStore::new(clock.clone()),
            expenses: VersionStore::new(clock.clone()),
            goals: VersionStore::new(clock.clone()),
            cashbacks: VersionStore::new(clock.clone()),
            balances: VersionStore::new(clock),
        }
    }

    pub fn seeded(clock: SharedClock, seed: Seed) -> StoreResult<Self> {
        Ok(Self {
            incomes: VersionStore::with_seed(clock.clone(), seed.incomes)?,
            expected_incomes: VersionStore::with_seed(clock.clone(), seed.expected_incomes)?,
            expenses: VersionStore::with_seed(clock.clone(), seed.expenses)?,
            goals: VersionStore::with_seed(clock.clone(), seed.goals)?,
            cashbacks: VersionStore::with_seed(clock.clone(), seed.cashbacks)?,
            balances: VersionStore::with_seed(clock, seed.balances)?,
        })
    }

    /// Demo data in debug mode, empty stores otherwise.
    pub fn from_config(config: &AppConfig, clock: SharedClock) -> StoreResult<Self> {
        if config.seeds_demo_data() {
            let now = TimeStamp::from_clock(clock.as_ref());
            info!(mode = ?config.mode, "seeding ledger with demo data");
            Self::seeded(clock, Seed::demo(now, &config.actor))
        } else {
            Ok(Self::new(clock))
        }
    }

    /// Current versions of one record type in transport form.
    pub fn current_json(&self, kind: RecordKind) -> StoreResult<Vec<serde_json::Value>> {
        match kind {
            RecordKind::Income => to_json(self.incomes.get_all()?),
            RecordKind::IncomeExpected => to_json(self.expected_incomes.get_all()?),
            RecordKind::Expense => to_json(self.expenses.get_all()?),
            RecordKind::Goal => to_json(self.goals.get_all()?),
            RecordKind::Cashback => to_json(self.cashbacks.get_all()?),
            RecordKind::Balance => to_json(self.balances.get_all()?),
        }
    }

    pub fn history_json(&self, kind: RecordKind, id: EntityId) -> StoreResult<Vec<serde_json::Value>> {
        match kind {
            RecordKind::Income => to_json(self.incomes.history(id)?),
            RecordKind::IncomeExpected => to_json(self.expected_incomes.history(id)?),
            RecordKind::Expense => to_json(self.expenses.history(id)?),
            RecordKind::Goal => to_json(self.goals.history(id)?),
            RecordKind::Cashback => to_json(self.cashbacks.history(id)?),
            RecordKind::Balance => to_json(self.balances.history(id)?),
        }
    }

    pub fn journal(&self, kind: RecordKind) -> StoreResult<Vec<Change>> {
        match kind {
            RecordKind::Income => self.incomes.journal_all(),
            RecordKind::IncomeExpected => self.expected_incomes.journal_all(),
            RecordKind::Expense => self.expenses.journal_all(),
            RecordKind::Goal => self.goals.journal_all(),
            RecordKind::Cashback => self.cashbacks.journal_all(),
            RecordKind::Balance => self.balances.journal_all(),
        }
    }
}

fn to_json<R: Record>(versions: Vec<Version<R>>) -> StoreResult<Vec<serde_json::Value>> {
    versions.iter().map(Version::to_transport).collect()
}
