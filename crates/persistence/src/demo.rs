//! Seeded demo organization
//!
//! Two divisions, three areas, six agents with fixed performance profiles
//! and a banking product catalog. Activity and sales are generated for each
//! of the trailing months, so training has real agent-months to learn from.

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use salesai_core::{Activity, ActivityType, Agent, AreaManager, DateWindow, DivisionHead, Product, Sale};

use crate::Dataset;

/// Activity ranges (inclusive) and sales share of target for one profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceProfile {
    High,
    Medium,
    Low,
}

impl PerformanceProfile {
    fn range(&self, activity_type: ActivityType) -> (u64, u64) {
        match (self, activity_type) {
            (Self::High, ActivityType::Call) => (80, 120),
            (Self::High, ActivityType::Meeting) => (35, 50),
            (Self::High, ActivityType::Lead) => (25, 40),
            (Self::High, ActivityType::Deal) => (12, 20),
            (Self::Medium, ActivityType::Call) => (50, 80),
            (Self::Medium, ActivityType::Meeting) => (20, 35),
            (Self::Medium, ActivityType::Lead) => (15, 25),
            (Self::Medium, ActivityType::Deal) => (8, 12),
            (Self::Low, ActivityType::Call) => (20, 50),
            (Self::Low, ActivityType::Meeting) => (10, 20),
            (Self::Low, ActivityType::Lead) => (5, 15),
            (Self::Low, ActivityType::Deal) => (2, 8),
        }
    }

    fn sales_share(&self) -> (f64, f64) {
        match self {
            Self::High => (0.85, 1.1),
            Self::Medium => (0.6, 0.85),
            Self::Low => (0.3, 0.6),
        }
    }

    fn notes(activity_type: ActivityType, n: u64) -> String {
        match activity_type {
            ActivityType::Call => format!("Customer outreach call {}", n),
            ActivityType::Meeting => format!("Client meeting {}", n),
            ActivityType::Lead => format!("New lead {}", n),
            ActivityType::Deal => format!("Deal closed {}", n),
        }
    }
}

const DIVISION_HEADS: [(&str, &str, &str, &str); 2] = [
    ("DH01", "Robert Williams", "robert.w@company.com", "North Division"),
    ("DH02", "Jennifer Martinez", "jennifer.m@company.com", "South Division"),
];

const AREA_MANAGERS: [(&str, &str, &str, &str, &str); 3] = [
    ("AM01", "Carlos Thompson", "carlos.t@company.com", "DH01", "North Region A"),
    ("AM02", "Lisa Anderson", "lisa.a@company.com", "DH01", "North Region B"),
    ("AM03", "James Wilson", "james.w@company.com", "DH02", "South Region A"),
];

const AGENTS: [(&str, &str, &str, f64, &str, PerformanceProfile); 6] = [
    ("A101", "Maria Santos", "maria@company.com", 600_000.0, "AM01", PerformanceProfile::High),
    ("A102", "John Smith", "john@company.com", 550_000.0, "AM01", PerformanceProfile::Medium),
    ("A103", "Sarah Johnson", "sarah@company.com", 700_000.0, "AM02", PerformanceProfile::High),
    ("A104", "Michael Chen", "michael@company.com", 500_000.0, "AM02", PerformanceProfile::Low),
    ("A105", "Emily Davis", "emily@company.com", 650_000.0, "AM03", PerformanceProfile::Medium),
    ("A106", "David Rodriguez", "david@company.com", 580_000.0, "AM03", PerformanceProfile::Low),
];

const PRODUCTS: [(&str, &str, &str, &str, f64); 10] = [
    ("LOAN-001", "Personal Loan", "Loan", "Unsecured personal financing up to ₱2M", 2.5),
    ("LOAN-002", "Auto Loan", "Loan", "Car financing with low interest rates", 3.0),
    ("LOAN-003", "Home Loan", "Loan", "Housing loan up to ₱15M, 30 years to pay", 1.5),
    ("CC-001", "Classic Credit Card", "Credit Card", "Entry-level credit card with rewards", 5.0),
    ("CC-002", "Gold Credit Card", "Credit Card", "Premium card with travel benefits", 6.0),
    ("INS-001", "Life Insurance", "Insurance", "Whole life insurance coverage", 15.0),
    ("INS-002", "Health Insurance", "Insurance", "Comprehensive health coverage", 12.0),
    ("INV-001", "Time Deposit", "Investment", "High-yield time deposit accounts", 1.0),
    ("INV-002", "Mutual Funds", "Investment", "Diversified investment portfolio", 2.5),
    ("ACC-001", "Savings Account", "Account", "High-interest savings account", 1.0),
];

/// Seeded generator for a demo dataset
#[derive(Debug, Clone)]
pub struct DemoOrganization {
    seed: u64,
    months: u32,
}

impl Default for DemoOrganization {
    fn default() -> Self {
        Self { seed: 42, months: 6 }
    }
}

impl DemoOrganization {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Number of trailing months to populate, the current one included
    pub fn with_months(mut self, months: u32) -> Self {
        self.months = months.max(1);
        self
    }

    /// Generate the dataset as of `today`; same seed and date give the same data
    pub fn generate(&self, today: NaiveDate) -> Dataset {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut dataset = Dataset {
            division_heads: DIVISION_HEADS
                .iter()
                .map(|(id, name, email, division)| DivisionHead {
                    id: id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    division_name: division.to_string(),
                })
                .collect(),
            area_managers: AREA_MANAGERS
                .iter()
                .map(|(id, name, email, head, area)| AreaManager {
                    id: id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    division_head_id: head.to_string(),
                    area_name: area.to_string(),
                })
                .collect(),
            agents: AGENTS
                .iter()
                .map(|(id, name, email, target, manager, _)| Agent {
                    id: id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    monthly_target: *target,
                    area_manager_id: Some(manager.to_string()),
                })
                .collect(),
            products: PRODUCTS
                .iter()
                .map(|(id, name, category, description, rate)| Product {
                    id: id.to_string(),
                    name: name.to_string(),
                    category: category.to_string(),
                    description: description.to_string(),
                    commission_rate: *rate,
                })
                .collect(),
            activities: Vec::new(),
            sales: Vec::new(),
        };

        // Oldest month first so ids increase with time
        let mut windows = DateWindow::trailing_months(today, self.months);
        windows.reverse();

        for window in windows {
            // The current month only has days up to today
            let last_day = if window.contains_date(today) {
                today.day0() as i64
            } else {
                (window.days() - 1).min(27)
            };

            for (agent_id, _, _, target, _, profile) in AGENTS {
                self.generate_month(
                    &mut rng,
                    &mut dataset,
                    agent_id,
                    target,
                    profile,
                    window.start,
                    last_day,
                );
            }
        }

        tracing::info!(
            seed = self.seed,
            months = self.months,
            activities = dataset.activities.len(),
            sales = dataset.sales.len(),
            "Demo organization generated"
        );

        dataset
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_month(
        &self,
        rng: &mut StdRng,
        dataset: &mut Dataset,
        agent_id: &str,
        monthly_target: f64,
        profile: PerformanceProfile,
        month_start: NaiveDate,
        last_day: i64,
    ) {
        let mut deals = 0;
        for activity_type in ActivityType::ALL {
            let (lo, hi) = profile.range(activity_type);
            let count = rng.gen_range(lo..=hi);
            if activity_type == ActivityType::Deal {
                deals = count;
            }
            for n in 1..=count {
                let id = format!("ACT{:05}", dataset.activities.len() + 1);
                dataset.activities.push(Activity {
                    id,
                    agent_id: agent_id.to_string(),
                    activity_type,
                    value: 0.0,
                    occurred_at: timestamp(rng, month_start, last_day),
                    notes: PerformanceProfile::notes(activity_type, n),
                });
            }
        }

        // Split the month's total into one sale per deal, the last one takes the remainder
        let (lo, hi) = profile.sales_share();
        let total = rng.gen_range(monthly_target * lo..monthly_target * hi).round();
        let mut booked = 0.0;
        for n in 1..=deals {
            let amount = if n < deals {
                let share = total / deals as f64;
                rng.gen_range(share * 0.5..share * 1.5)
                    .round()
                    .min(total - booked)
            } else {
                (total - booked).max(0.0)
            };
            if amount <= 0.0 {
                continue;
            }
            booked += amount;

            let product = &PRODUCTS[rng.gen_range(0..PRODUCTS.len())];
            let id = format!("S{:05}", dataset.sales.len() + 1);
            dataset.sales.push(Sale {
                id,
                agent_id: agent_id.to_string(),
                amount,
                customer: format!("Customer #{}", rng.gen_range(1000..=9999)),
                product_id: Some(product.0.to_string()),
                occurred_at: timestamp(rng, month_start, last_day),
                notes: format!("Sale transaction {}", n),
            });
        }
    }
}

fn timestamp(rng: &mut StdRng, month_start: NaiveDate, last_day: i64) -> chrono::DateTime<Utc> {
    let date = month_start + Duration::days(rng.gen_range(0..=last_day.max(0)));
    let hour = rng.gen_range(8..18);
    let minute = rng.gen_range(0..60);
    let naive = date.and_hms_opt(hour, minute, 0).unwrap_or_default();
    Utc.from_utc_datetime(&naive)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    #[test]
    fn test_same_seed_same_dataset() {
        let a = DemoOrganization::new(7).generate(today());
        let b = DemoOrganization::new(7).generate(today());
        assert_eq!(a, b);

        let c = DemoOrganization::new(8).generate(today());
        assert_ne!(a.activities.len() + a.sales.len(), 0);
        assert_ne!(a, c);
    }

    #[test]
    fn test_dataset_is_valid() {
        let dataset = DemoOrganization::default().generate(today());
        assert!(dataset.validate().is_ok());
        assert_eq!(dataset.division_heads.len(), 2);
        assert_eq!(dataset.area_managers.len(), 3);
        assert_eq!(dataset.agents.len(), 6);
    }

    #[test]
    fn test_current_month_has_no_future_activity() {
        let dataset = DemoOrganization::default().with_months(1).generate(today());
        assert!(!dataset.activities.is_empty());
        for activity in &dataset.activities {
            let date = activity.occurred_at.date_naive();
            assert!(date <= today(), "activity dated {}", date);
            assert!(date >= NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        }
    }

    #[test]
    fn test_sales_stay_within_profile() {
        let dataset = DemoOrganization::default().with_months(1).generate(today());
        let window = DateWindow::month(2026, 10);
        let low_total: f64 = dataset
            .sales
            .iter()
            .filter(|s| s.agent_id == "A104" && window.contains(&s.occurred_at))
            .map(|s| s.amount)
            .sum();
        // Low performer: at most 60% of a 500k target
        assert!(low_total <= 300_000.0 + 1.0);
    }
}
