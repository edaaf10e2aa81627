//! DOM-to-record extraction.
//!
//! Turning a console detail page into structured data happens in layers:
//! labeled fields ([`field`]), text pattern scanners ([`patterns`]), table
//! classification ([`tables`]) and OS inference ([`os`]) feed the per-tab
//! extractors in [`ec2`] and [`lightsail`], and [`aggregate`] merges the
//! resulting partials into one [`crate::record::InstanceRecord`].

pub mod aggregate;
pub mod ec2;
pub mod field;
pub mod lightsail;
pub mod os;
pub mod patterns;
pub mod tables;

pub use aggregate::{build_ec2_record, build_lightsail_record};
pub use field::{extract_field, extract_field_any, extract_field_exact, presence};
pub use tables::{extract_tags, TableRole};
