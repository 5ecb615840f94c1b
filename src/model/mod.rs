//! Domain types shared by storage, services and the REST layer.

/// Store a string-backed enum as TEXT using its `as_str`/`FromStr` pair.
macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl rusqlite::types::ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $ty {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value.as_str()?.parse().map_err(|err: crate::error::SbError| {
                    rusqlite::types::FromSqlError::Other(Box::new(err))
                })
            }
        }
    };
}

pub mod artifacts;
pub mod contact;
pub mod customer;
pub mod deal;
pub mod person;
pub mod satisfaction;

pub use artifacts::{
    AiInsight, ConversationData, NewInsight, Proposal, ProposalStatus, ResourceAllocation,
    TechnicalSolution,
};
pub use contact::{Contact, ContactPatch, ContactStatus, NewContact};
pub use customer::{ChurnPredictionRecord, Customer, CustomerActivity, LifecycleStage};
pub use deal::{
    Comment, Deal, DealPatch, DealStatus, LOST_STAGE, NewComment, NewDeal, Priority, StatusHistory,
    WON_STAGE,
};
pub use person::{NewPerson, Person, PersonRole};
pub use satisfaction::{CustomerSatisfaction, HealthStatus};

/// Uppercase the first letter of every word and lowercase the rest.
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
