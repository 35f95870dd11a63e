use corral_core::{Board, Dispatcher, Highlight, Intake, Lead, LeadId, Status};
use serde_json::Value;

use crate::feed::{DeliveryConfig, World};
use crate::rng::DeterministicRng;

// ── Core result types ─────────────────────────────────────────────────────────

/// Oracle result for an invariant check.
///
/// Returned by each invariant checker and by [`ConvergenceOracle::check_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleResult {
    /// `true` iff no violations were found.
    pub passed: bool,
    /// Detailed description of every invariant that was violated.
    pub violations: Vec<InvariantViolation>,
}

impl OracleResult {
    /// Construct a passing result.
    #[must_use]
    const fn pass() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
        }
    }

    /// Construct a failing result from one or more violations.
    #[must_use]
    const fn fail(violations: Vec<InvariantViolation>) -> Self {
        Self {
            passed: false,
            violations,
        }
    }

    /// Merge another result into this one (failures accumulate).
    #[must_use]
    fn merge(mut self, other: Self) -> Self {
        if !other.passed {
            self.passed = false;
            self.violations.extend(other.violations);
        }
        self
    }
}

// ── Invariant violation diagnostics ──────────────────────────────────────────

/// Diagnostic information for a single failed invariant check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Two delivery orders of the same world settled on different boards.
    Divergence {
        /// Delivery order that diverged from order 0.
        order: usize,
        /// What differs, by lead id.
        detail: String,
    },
    /// The same id appeared twice on one board.
    DuplicateId { id: String },
    /// A seeded local edit was reverted by a snapshot refresh.
    OverlayReverted {
        id: String,
        expected: Status,
        found: Status,
    },
    /// A lead's highlight does not match its indexed payments.
    HighlightMismatch {
        id: String,
        expected: Highlight,
        found: Highlight,
    },
}

// ── Oracle ───────────────────────────────────────────────────────────────────

/// Runs a world through many delivery orders and checks the invariants the
/// merge core promises.
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceOracle {
    /// How many randomized delivery orders to compare.
    pub orders: usize,
    pub config: DeliveryConfig,
}

impl Default for ConvergenceOracle {
    fn default() -> Self {
        Self {
            orders: 8,
            config: DeliveryConfig::default(),
        }
    }
}

impl ConvergenceOracle {
    /// Run every check against one seeded world.
    #[must_use]
    pub fn check_all(&self, seed: u64) -> OracleResult {
        let mut rng = DeterministicRng::new(seed);
        let world = World::generate(&mut rng, &self.config);
        self.check_convergence(&world, &mut rng)
            .merge(self.check_overlay_retention(&world, &mut rng))
            .merge(Self::check_highlights(&world))
    }

    /// All delivery orders settle on the same duplicate-free board.
    #[must_use]
    pub fn check_convergence(&self, world: &World, rng: &mut DeterministicRng) -> OracleResult {
        let mut violations = Vec::new();
        let mut reference: Option<Vec<Lead>> = None;

        for order in 0..self.orders {
            let plan = world.delivery_plan(rng, &self.config);
            let mut dispatcher = Dispatcher::new();
            for intake in plan {
                dispatcher.push(intake);
            }
            dispatcher.run_until_idle();

            violations.extend(duplicate_ids(dispatcher.board()));

            let settled = sorted_leads(dispatcher.board());
            match &reference {
                None => reference = Some(settled),
                Some(expected) if *expected != settled => {
                    violations.push(InvariantViolation::Divergence {
                        order,
                        detail: first_difference(expected, &settled),
                    });
                }
                Some(_) => {}
            }
        }

        if violations.is_empty() {
            OracleResult::pass()
        } else {
            OracleResult::fail(violations)
        }
    }

    /// A local status edit made between deliveries survives every
    /// subsequent refresh.
    #[must_use]
    pub fn check_overlay_retention(
        &self,
        world: &World,
        rng: &mut DeterministicRng,
    ) -> OracleResult {
        let Some(target) = world.leads.first() else {
            return OracleResult::pass();
        };
        let id = LeadId::new(&target.id);
        // Pick an edit that differs from the snapshot's value, so the flag
        // is guaranteed to be set and nothing can "echo" it back.
        let snapshot_status = target
            .fields
            .get("status")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Status>().ok())
            .unwrap_or_default();
        let edit = if snapshot_status == Status::Lost {
            Status::Closed
        } else {
            Status::Lost
        };

        let mut dispatcher = Dispatcher::new();
        dispatcher.push(Intake::LeadsSnapshot(world.leads.clone()));
        dispatcher.run_until_idle();
        dispatcher.push(Intake::StatusChange {
            id: id.clone(),
            status: edit,
        });
        dispatcher.run_until_idle();

        for intake in world.delivery_plan(rng, &self.config) {
            dispatcher.push(intake);
        }
        dispatcher.run_until_idle();

        match dispatcher.board().get(&id) {
            Some(lead) if lead.status == edit => OracleResult::pass(),
            Some(lead) => OracleResult::fail(vec![InvariantViolation::OverlayReverted {
                id: id.to_string(),
                expected: edit,
                found: lead.status,
            }]),
            None => OracleResult::fail(vec![InvariantViolation::OverlayReverted {
                id: id.to_string(),
                expected: edit,
                found: Status::default(),
            }]),
        }
    }

    /// Highlights follow the fixed meeting-over-message priority.
    #[must_use]
    pub fn check_highlights(world: &World) -> OracleResult {
        let mut dispatcher = Dispatcher::new();
        dispatcher.push(Intake::UsersSnapshot(world.users.clone()));
        dispatcher.push(Intake::LeadsSnapshot(world.leads.clone()));
        dispatcher.push(Intake::PaymentsSnapshot(world.payments.clone()));
        dispatcher.run_until_idle();

        let mut violations = Vec::new();
        for lead in dispatcher.board().leads() {
            let expected = expected_highlight(world, &lead.id);
            let found = dispatcher.payments().highlight_for(&lead.id);
            if expected != found {
                violations.push(InvariantViolation::HighlightMismatch {
                    id: lead.id.to_string(),
                    expected,
                    found,
                });
            }
        }

        if violations.is_empty() {
            OracleResult::pass()
        } else {
            OracleResult::fail(violations)
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn sorted_leads(board: &Board) -> Vec<Lead> {
    let mut leads = board.leads().to_vec();
    leads.sort_by(|a, b| a.id.cmp(&b.id));
    leads
}

fn duplicate_ids(board: &Board) -> Vec<InvariantViolation> {
    let mut seen = std::collections::HashSet::new();
    board
        .leads()
        .iter()
        .filter(|l| !seen.insert(l.id.clone()))
        .map(|l| InvariantViolation::DuplicateId {
            id: l.id.to_string(),
        })
        .collect()
}

fn first_difference(expected: &[Lead], found: &[Lead]) -> String {
    if expected.len() != found.len() {
        return format!("{} leads vs {}", expected.len(), found.len());
    }
    expected
        .iter()
        .zip(found)
        .find(|(e, f)| e != f)
        .map_or_else(
            || "boards differ".to_string(),
            |(e, _)| format!("lead {} differs", e.id),
        )
}

fn expected_highlight(world: &World, id: &LeadId) -> Highlight {
    let options: Vec<&str> = world
        .payments
        .iter()
        .filter(|p| p.fields.get("userId").and_then(Value::as_str) == Some(id.as_str()))
        .filter_map(|p| p.fields.get("option").and_then(Value::as_str))
        .collect();
    if options.contains(&"meeting") {
        Highlight::Meeting
    } else if options.contains(&"message") {
        Highlight::Message
    } else {
        Highlight::None
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
