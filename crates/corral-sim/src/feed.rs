//! World generation and randomized snapshot delivery.
//!
//! A world is one consistent backend state: its `users`, `leads`, and
//! `payments` documents. A delivery plan is one way the three full
//! snapshots could reach the dispatcher: cross-source order shuffled,
//! optionally with duplicate deliveries (re-delivering a full snapshot is
//! legal and must be a no-op).

use serde_json::{Value, json};

use corral_core::{Intake, RawDoc};

use crate::rng::DeterministicRng;

const STATUS_LABELS: [&str; 4] = ["Novo", "Em Progresso", "Fechado", "Perdido"];
const OPTIONS: [&str; 2] = ["message", "meeting"];

/// Knobs for world generation and delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryConfig {
    /// People in the world; each gets a `users` doc.
    pub people: u8,
    /// Percentage of people who also have a curated `leads` doc.
    pub lead_rate_percent: u8,
    /// Percentage of people with at least one payment.
    pub payment_rate_percent: u8,
    /// Percentage chance each snapshot is delivered twice.
    pub duplicate_rate_percent: u8,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            people: 8,
            lead_rate_percent: 60,
            payment_rate_percent: 40,
            duplicate_rate_percent: 25,
        }
    }
}

/// One consistent backend state.
#[derive(Debug, Clone)]
pub struct World {
    pub users: Vec<RawDoc>,
    pub leads: Vec<RawDoc>,
    pub payments: Vec<RawDoc>,
}

impl World {
    /// Generate a world from a seed. Same seed, same world.
    #[must_use]
    pub fn generate(rng: &mut DeterministicRng, config: &DeliveryConfig) -> Self {
        let mut users = Vec::new();
        let mut leads = Vec::new();
        let mut payments = Vec::new();

        for n in 0..config.people {
            let id = format!("p{n}");
            let mut fields = serde_json::Map::new();
            fields.insert("name".to_string(), json!(format!("pessoa-{n}")));
            fields.insert(
                "email".to_string(),
                json!(format!("pessoa-{n}@example.com")),
            );
            if rng.hit_rate_percent(70) {
                fields.insert("phone".to_string(), json!(format!("9{n:08}")));
            }
            users.push(RawDoc::new(id.clone(), fields));

            if rng.hit_rate_percent(config.lead_rate_percent) {
                leads.push(Self::lead_doc(rng, &id, n));
            }
            if rng.hit_rate_percent(config.payment_rate_percent) {
                let count = 1 + rng.next_bounded(2);
                for k in 0..count {
                    payments.push(Self::payment_doc(rng, &id, n, k));
                }
            }
        }

        Self {
            users,
            leads,
            payments,
        }
    }

    fn lead_doc(rng: &mut DeterministicRng, id: &str, n: u8) -> RawDoc {
        #[allow(clippy::cast_possible_truncation)]
        let status = STATUS_LABELS[rng.next_bounded(STATUS_LABELS.len() as u64) as usize];
        let comments: Vec<Value> = (0..rng.next_bounded(3))
            .map(|c| json!(format!("nota-{n}-{c}")))
            .collect();
        let mut fields = serde_json::Map::new();
        // Curated records carry their own display fields, which must win.
        fields.insert("name".to_string(), json!(format!("lead-{n}")));
        fields.insert("email".to_string(), json!(format!("lead-{n}@example.com")));
        fields.insert("status".to_string(), json!(status));
        fields.insert("comments".to_string(), Value::Array(comments));
        RawDoc::new(id, fields)
    }

    fn payment_doc(rng: &mut DeterministicRng, user_id: &str, n: u8, k: u64) -> RawDoc {
        #[allow(clippy::cast_possible_truncation)]
        let option = OPTIONS[rng.next_bounded(OPTIONS.len() as u64) as usize];
        let mut fields = serde_json::Map::new();
        fields.insert("userId".to_string(), json!(user_id));
        fields.insert("option".to_string(), json!(option));
        fields.insert("status".to_string(), json!("pending"));
        fields.insert("userPhone".to_string(), json!(format!("9{n:08}")));
        if option == "meeting" {
            fields.insert(
                "meetingDetails".to_string(),
                json!({"date": "2025-05-01", "environment": "café", "expectation": "conversa"}),
            );
        }
        RawDoc::new(format!("pay-{n}-{k}"), fields)
    }

    /// One randomized delivery of this world's three snapshots.
    #[must_use]
    pub fn delivery_plan(
        &self,
        rng: &mut DeterministicRng,
        config: &DeliveryConfig,
    ) -> Vec<Intake> {
        let mut plan = vec![
            Intake::UsersSnapshot(self.users.clone()),
            Intake::LeadsSnapshot(self.leads.clone()),
            Intake::PaymentsSnapshot(self.payments.clone()),
        ];
        if rng.hit_rate_percent(config.duplicate_rate_percent) {
            #[allow(clippy::cast_possible_truncation)]
            let pick = rng.next_bounded(plan.len() as u64) as usize;
            let dup = plan[pick].clone();
            plan.push(dup);
        }
        rng.shuffle(&mut plan);
        plan
    }
}
