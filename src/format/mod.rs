//! Report formatting and mail dispatch.

pub mod composer;
pub mod email;

pub use composer::{plan_compose, ComposeAction, Composer, MAX_URL_LENGTH};
pub use email::{format_body, format_subject, SEPARATOR_FULL, SEPARATOR_SHORT};

use crate::record::{AccountInfo, InstanceRecord};

/// Render both body variants and plan the compose action: the compact
/// body rides in the URL, the full body lands on the clipboard when the
/// URL is over budget.
pub fn compose_report(
    record: &InstanceRecord,
    account: &AccountInfo,
    composer: Composer,
) -> ComposeAction {
    let subject = format_subject(record);
    let compact_body = format_body(record, account, true);
    let full_body = format_body(record, account, false);
    plan_compose(composer, &subject, &compact_body, Some(&full_body))
}
