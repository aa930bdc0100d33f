//! Builtin rule set.
//!
//! One module per rule; [`all`] returns them in canonical
//! registration order, which is also their conflict-resolution
//! priority.

use crate::RuleDescriptor;

mod alias_usage;
mod empty_catch;
mod insecure_url;
mod invoke_expression;
mod plaintext_password;
mod trailing_whitespace;

pub use alias_usage::canonical_cmdlet;

pub fn all() -> Vec<RuleDescriptor> {
    vec![
        alias_usage::rule(),
        empty_catch::rule(),
        invoke_expression::rule(),
        insecure_url::rule(),
        plaintext_password::rule(),
        trailing_whitespace::rule(),
    ]
}
