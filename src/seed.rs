//! Deterministic demo dataset for `sprintboard init --seed`.
//!
//! Every value comes from a [`StdRng`] seeded with `analytics.seed`, so two
//! databases seeded with the same number are identical apart from timestamps.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::contacts;
use crate::customer_success;
use crate::error::Result;
use crate::model::{
    ContactStatus, ConversationData, Customer, CustomerSatisfaction, DealStatus, HealthStatus,
    LifecycleStage, NewComment, NewContact, NewDeal, NewPerson, PersonRole, Priority, WON_STAGE,
};
use crate::sprint;
use crate::storage::Database;

const PEOPLE: [(&str, PersonRole, &str); 8] = [
    ("Maya Chen", PersonRole::Sales, "Sales"),
    ("Luis Ortega", PersonRole::Sales, "Sales"),
    ("Priya Nair", PersonRole::Sales, "Sales"),
    ("Tomasz Nowak", PersonRole::HeadOfEngineering, "Engineering"),
    ("Grace Okafor", PersonRole::HeadOfDelivery, "Delivery"),
    ("Henrik Berg", PersonRole::Cso, "Executive"),
    ("Aiko Tanaka", PersonRole::ProjectManager, "Delivery"),
    ("Samir Haddad", PersonRole::ProjectManager, "Delivery"),
];

const COMPANIES: [&str; 12] = [
    "Northwind Logistics",
    "Bluefin Retail",
    "Helios Energy",
    "Kestrel Health",
    "Atlas Freight",
    "Cobalt Finance",
    "Juniper Foods",
    "Meridian Telecom",
    "Orchid Pharma",
    "Summit Insurance",
    "Tidewater Ports",
    "Vertex Manufacturing",
];

const COUNTRIES: [(&str, &str); 6] = [
    ("EMEA", "Germany"),
    ("EMEA", "United Kingdom"),
    ("NA", "United States"),
    ("NA", "Canada"),
    ("APAC", "Singapore"),
    ("APAC", "Australia"),
];

const REQUIREMENTS: [&str; 4] = [
    "Replace spreadsheet order tracking with a web portal",
    "Customer data platform with real-time dashboards",
    "Mobile field-service app integrated with SAP",
    "Migrate legacy CRM to the cloud with SSO",
];

const TIMELINES: [&str; 4] = ["3 months", "6 months", "9 months", "12 months"];
const URGENCY: [&str; 3] = ["low", "medium", "high"];
const INDUSTRIES: [&str; 6] = ["Retail", "Finance", "Healthcare", "Logistics", "Energy", "SaaS"];
const LEAD_SOURCES: [&str; 5] = ["Website", "Referral", "Event", "Outbound", "Partner"];
const ROLES: [&str; 4] = ["CEO", "CTO", "VP Sales", "Manager"];
const FIRST_NAMES: [&str; 8] = ["Ana", "Ben", "Chloe", "Dev", "Elif", "Femi", "Gus", "Hana"];
const LAST_NAMES: [&str; 6] = ["Silva", "Brown", "Kaur", "Novak", "Okoro", "Lind"];

/// Number of lifecycle customers written by [`seed_demo`].
pub const CUSTOMER_COUNT: usize = 48;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// True when the database already had persons and nothing was written.
    pub skipped: bool,
    pub persons: usize,
    pub deals: usize,
    pub comments: usize,
    pub contacts: usize,
    pub satisfaction_records: usize,
    pub customers: usize,
}

/// Fill an empty database with demo data. A database that already has
/// persons is left alone.
pub fn seed_demo(db: &Database, seed: u64, now: DateTime<Utc>) -> Result<SeedReport> {
    if db.count_persons()? > 0 {
        tracing::warn!("database already has data; demo seed skipped");
        return Ok(SeedReport {
            skipped: true,
            ..SeedReport::default()
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut report = SeedReport::default();

    let tx = db.transaction()?;
    seed_persons(db, now, &mut report)?;
    seed_deals(db, &mut rng, now, &mut report)?;
    seed_contacts(db, &mut rng, now, &mut report)?;
    seed_customers(db, &mut rng, now, &mut report)?;
    tx.commit()?;

    tracing::info!(
        persons = report.persons,
        deals = report.deals,
        contacts = report.contacts,
        customers = report.customers,
        "demo data seeded"
    );
    Ok(report)
}

fn seed_persons(db: &Database, now: DateTime<Utc>, report: &mut SeedReport) -> Result<()> {
    for (name, role, department) in PEOPLE {
        let email = format!(
            "{}@sprintboard.example",
            name.to_ascii_lowercase().replace(' ', ".")
        );
        let skills = match role {
            PersonRole::HeadOfEngineering => vec!["Architecture".to_string(), "Rust".to_string()],
            PersonRole::HeadOfDelivery | PersonRole::ProjectManager => {
                vec!["Scrum".to_string(), "Planning".to_string()]
            }
            PersonRole::Sales | PersonRole::Cso => vec!["Negotiation".to_string()],
        };
        sprint::create_person(
            db,
            &NewPerson {
                name: name.to_string(),
                email,
                role,
                department: Some(department.to_string()),
                skills,
                availability: 1.0,
                hourly_rate: Some(if role == PersonRole::Cso { 180.0 } else { 95.0 }),
            },
            now,
        )?;
        report.persons += 1;
    }
    Ok(())
}

fn seed_deals(
    db: &Database,
    rng: &mut StdRng,
    now: DateTime<Utc>,
    report: &mut SeedReport,
) -> Result<()> {
    let statuses = DealStatus::ALL.iter().flat_map(|status| [*status, *status]);
    for (index, status) in statuses.enumerate() {
        let company = COMPANIES[index % COMPANIES.len()];
        let (region, country) = *COUNTRIES.choose(rng).unwrap_or(&COUNTRIES[0]);
        let value = f64::from(rng.random_range(20..400_u32)) * 1000.0;
        let closed = matches!(status, DealStatus::Deal | DealStatus::Project);
        let owner = db.first_person_with_role(status.owner_role())?;

        let deal = sprint::create_deal(
            db,
            &NewDeal {
                title: format!("{company} platform"),
                description: Some(REQUIREMENTS[index % REQUIREMENTS.len()].to_string()),
                status,
                priority: [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent]
                    [index % 4],
                customer_name: Some(company.to_string()),
                customer_email: Some(format!(
                    "buyer@{}.example",
                    company.split(' ').next().unwrap_or(company).to_ascii_lowercase()
                )),
                contact_person: Some(format!(
                    "{} {}",
                    FIRST_NAMES[index % FIRST_NAMES.len()],
                    LAST_NAMES[index % LAST_NAMES.len()]
                )),
                region: Some(region.to_string()),
                country: Some(country.to_string()),
                assigned_person_id: owner.map(|p| p.id),
                estimated_value: Some(value),
                budget_range_min: Some(value * 0.8),
                budget_range_max: Some(value * 1.2),
                deal_stage: closed.then(|| WON_STAGE.to_string()),
                deal_probability: Some(if closed { 100 } else { 20 + 10 * i64::from(status as u8) }),
                expected_close_date: Some(now.date_naive() + Duration::days(rng.random_range(14..120))),
                actual_close_date: closed.then(|| now - Duration::days(rng.random_range(10..60))),
            },
            now,
        )?;
        report.deals += 1;

        db.upsert_conversation(&ConversationData {
            deal_id: deal.id,
            customer_requirements: Some(REQUIREMENTS[index % REQUIREMENTS.len()].to_string()),
            business_goals: Some("Cut manual processing time in half".to_string()),
            pain_points: Some("Disconnected systems and slow reporting".to_string()),
            tech_preferences: Some("Cloud hosted, REST integrations".to_string()),
            project_timeline: Some((*TIMELINES.choose(rng).unwrap_or(&TIMELINES[0])).to_string()),
            urgency_level: Some((*URGENCY.choose(rng).unwrap_or(&URGENCY[0])).to_string()),
            team_size: Some(format!("{} people", rng.random_range(5..40))),
            decision_makers: Some("CTO, CFO".to_string()),
            communication_channel: Some("video".to_string()),
            last_conversation_date: Some(now - Duration::days(rng.random_range(1..20))),
            ..ConversationData::default()
        })?;

        let comments = rng.random_range(1..=2);
        for n in 0..comments {
            let (name, role, _) = PEOPLE[(index + n) % PEOPLE.len()];
            sprint::add_comment(
                db,
                deal.id,
                &NewComment {
                    commenter_name: name.to_string(),
                    commenter_role: Some(role.as_str().to_string()),
                    comment_text: if n == 0 {
                        format!("Kick-off call with {company} went well")
                    } else {
                        "Waiting on budget confirmation".to_string()
                    },
                },
                now,
            )?;
            report.comments += 1;
        }

        if closed {
            seed_satisfaction(db, rng, deal.id, now)?;
            report.satisfaction_records += 1;
        }
    }
    Ok(())
}

fn seed_satisfaction(db: &Database, rng: &mut StdRng, deal_id: i64, now: DateTime<Utc>) -> Result<()> {
    let score = f64::from(rng.random_range(50..=100_u32)) / 10.0;
    let health = if score >= 8.0 {
        HealthStatus::Green
    } else if score >= 6.5 {
        HealthStatus::Yellow
    } else {
        HealthStatus::Red
    };
    let tickets = rng.random_range(0..12);
    customer_success::record_satisfaction(
        db,
        deal_id,
        CustomerSatisfaction {
            deal_id,
            overall_satisfaction_score: Some(score),
            nps_score: Some(f64::from(rng.random_range(0..=10_u32))),
            customer_health_status: Some(health),
            implementation_status: Some("in_progress".to_string()),
            completion_percentage: Some(f64::from(rng.random_range(10..=100_u32))),
            current_phase: Some("Build".to_string()),
            latest_feedback: Some("Team is responsive".to_string()),
            testimonial: None,
            last_contact_date: Some(now.date_naive() - Duration::days(rng.random_range(1..30))),
            next_check_in_date: Some(now.date_naive() + Duration::days(14)),
            support_tickets_count: tickets,
            support_tickets_resolved: rng.random_range(0..=tickets),
            usage_score: Some(f64::from(rng.random_range(40..=100_u32))),
            updated_at: now,
        },
        now,
    )?;
    Ok(())
}

fn seed_contacts(
    db: &Database,
    rng: &mut StdRng,
    now: DateTime<Utc>,
    report: &mut SeedReport,
) -> Result<()> {
    let owner = db.first_person_with_role(PersonRole::Sales)?.map(|p| p.id);
    let designer = db
        .first_person_with_role(PersonRole::HeadOfEngineering)?
        .map(|p| p.id);
    for (index, status) in ContactStatus::ALL.into_iter().enumerate() {
        let first = FIRST_NAMES[(index + 3) % FIRST_NAMES.len()];
        let last = LAST_NAMES[(index + 1) % LAST_NAMES.len()];
        let company = COMPANIES[(index * 5) % COMPANIES.len()];
        let revenue = f64::from(rng.random_range(10..250_u32)) * 1000.0;
        contacts::create_contact(
            db,
            &NewContact {
                full_name: format!("{first} {last}"),
                position: Some((*ROLES.choose(rng).unwrap_or(&ROLES[0])).to_string()),
                company_name: Some(company.to_string()),
                email: Some(format!(
                    "{}.{}@contacts.example",
                    first.to_ascii_lowercase(),
                    last.to_ascii_lowercase()
                )),
                phone_number: Some(format!("+1 555 01{index:02}")),
                gmv: Some(revenue * 4.0),
                estimated_revenue: Some(revenue),
                estimated_close_date: Some(now.date_naive() + Duration::days(rng.random_range(7..180))),
                contact_owner_id: owner,
                solution_designer_id: designer,
                delivery_team_assigned: None,
                status,
                note: None,
                lead_source: Some((*LEAD_SOURCES.choose(rng).unwrap_or(&LEAD_SOURCES[0])).to_string()),
                solution_interest: Some(REQUIREMENTS[index % REQUIREMENTS.len()].to_string()),
            },
            now,
        )?;
        report.contacts += 1;
    }
    Ok(())
}

fn seed_customers(
    db: &Database,
    rng: &mut StdRng,
    now: DateTime<Utc>,
    report: &mut SeedReport,
) -> Result<()> {
    let today = now.date_naive();
    for index in 0..CUSTOMER_COUNT {
        let customer = demo_customer(rng, index, today);
        if db.insert_customer(&customer, now)?.is_some() {
            report.customers += 1;
        }
    }
    Ok(())
}

/// One lifecycle record. Roughly half convert; a third of those churn.
fn demo_customer(rng: &mut StdRng, index: usize, today: NaiveDate) -> Customer {
    let created = today - Duration::days(rng.random_range(90..720));
    let first = FIRST_NAMES[index % FIRST_NAMES.len()];
    let last = LAST_NAMES[(index / FIRST_NAMES.len()) % LAST_NAMES.len()];
    let size = f64::from(rng.random_range(5..2000_u32));
    let mut customer = Customer {
        external_id: Some(format!("DEMO-{index:04}")),
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        email: format!(
            "{}.{}{index}@lifecycle.example",
            first.to_ascii_lowercase(),
            last.to_ascii_lowercase()
        ),
        industry: Some((*INDUSTRIES.choose(rng).unwrap_or(&INDUSTRIES[0])).to_string()),
        region: Some(COUNTRIES[index % COUNTRIES.len()].0.to_string()),
        lead_source: Some((*LEAD_SOURCES.choose(rng).unwrap_or(&LEAD_SOURCES[0])).to_string()),
        decision_maker_role: Some((*ROLES.choose(rng).unwrap_or(&ROLES[0])).to_string()),
        company_size: Some(size),
        lead_score: Some(f64::from(rng.random_range(10..=95_u32))),
        lead_creation_date: Some(created),
        stage_probability: Some(f64::from(rng.random_range(5..=60_u32)) / 100.0),
        ..Customer::default()
    };

    let funnel = index % 6;
    let mut at = created;
    if funnel >= 1 {
        at += Duration::days(rng.random_range(5..30));
        customer.advance_to(LifecycleStage::Mql, at);
    }
    if funnel >= 2 {
        at += Duration::days(rng.random_range(7..40));
        customer.advance_to(LifecycleStage::Sql, at);
    }
    if funnel >= 3 {
        let cycle = rng.random_range(20..90);
        at += Duration::days(cycle);
        customer.advance_to(LifecycleStage::Customer, at.min(today));
        let acv = f64::from(rng.random_range(8..120_u32)) * 1000.0;
        let tenure = f64::from(rng.random_range(1..36_u32));
        customer.acv = Some(acv);
        customer.ltv = Some(acv * (tenure / 12.0 + 1.0));
        customer.cac = Some(acv * f64::from(rng.random_range(10..40_u32)) / 100.0);
        customer.sales_cycle_days = Some(f64::from(u32::try_from(cycle).unwrap_or(0)));
        customer.tenure_months = Some(tenure);
        customer.renewals_count = Some((tenure / 12.0).floor());
        customer.logins_per_month = Some(f64::from(rng.random_range(0..60_u32)));
        customer.active_features_used = Some(f64::from(rng.random_range(1..20_u32)));
        customer.product_usage_hours = Some(f64::from(rng.random_range(0..200_u32)));
        customer.tickets_raised = Some(f64::from(rng.random_range(0..15_u32)));
        customer.avg_support_response_hours = Some(f64::from(rng.random_range(1..48_u32)));
        customer.nps_score = Some(f64::from(rng.random_range(0..=10_u32)));
        customer.expansion = rng.random_bool(0.3);
        customer.forecasted_revenue = Some(acv * 1.1);
    } else {
        customer.expected_close_date = Some(today + Duration::days(rng.random_range(10..120)));
    }
    if funnel == 5 {
        customer.logins_per_month = Some(f64::from(rng.random_range(0..5_u32)));
        let churned_on = today - Duration::days(rng.random_range(1..60));
        customer.advance_to(LifecycleStage::Churned, churned_on);
    }
    customer
}
