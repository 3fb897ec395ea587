//! # Verb Table
//!
//! Every verb has a fixed arity and usage line. Argument counts are checked
//! before anything else runs, so a malformed invocation never touches the
//! network or the wallet.

use std::path::PathBuf;

use mlchain_core::{IdentityName, ValidationError};
use mlchain_workflow::parse_amount;

/// One entry of the verb table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbSpec {
    /// Verb as typed on the command line.
    pub name: &'static str,
    /// Exact number of positional arguments.
    pub arity: usize,
    /// Usage line printed on arity mismatch.
    pub usage: &'static str,
}

/// All verbs, in the order their usages are printed.
pub const VERBS: &[VerbSpec] = &[
    VerbSpec { name: "submit", arity: 5, usage: "usage: mlchain submit 'walletUser' 'modelName' 'ipfsHash' 'inputdef' 'outputdef'" },
    VerbSpec { name: "authorize", arity: 3, usage: "usage: mlchain authorize 'walletUser' 'modelName' 'userToAuthorize'" },
    VerbSpec { name: "execute", arity: 3, usage: "usage: mlchain execute 'walletUser' 'modelName' 'inputPath'" },
    VerbSpec { name: "approve", arity: 3, usage: "usage: mlchain approve 'walletUser' 'clientIDToApprove' amount" },
    VerbSpec { name: "transferFrom", arity: 4, usage: "usage: mlchain transferFrom 'walletUser' 'from' 'to' amount" },
    VerbSpec { name: "transfer", arity: 3, usage: "usage: mlchain transfer 'walletUser' 'to' 'amount'" },
    VerbSpec { name: "enroll", arity: 1, usage: "usage: mlchain enroll username" },
    VerbSpec { name: "enrollUser", arity: 2, usage: "usage: mlchain enrollUser username 'secret'" },
    VerbSpec { name: "enrollAdmins", arity: 0, usage: "usage: mlchain enrollAdmins" },
    VerbSpec { name: "buy", arity: 2, usage: "usage: mlchain buy 'clientID' 'amount'" },
    VerbSpec { name: "getClientID", arity: 1, usage: "usage: mlchain getClientID 'walletUser'" },
    VerbSpec { name: "requestRole", arity: 2, usage: "usage: mlchain requestRole 'clientID' 'role'" },
    VerbSpec { name: "getAllModels", arity: 0, usage: "usage: mlchain getAllModels" },
    VerbSpec { name: "getModelsByUser", arity: 1, usage: "usage: mlchain getModelsByUser 'clientID'" },
    VerbSpec { name: "getModel", arity: 1, usage: "usage: mlchain getModel 'modelName'" },
    VerbSpec { name: "getBalance", arity: 1, usage: "usage: mlchain getBalance 'clientID'" },
    VerbSpec { name: "getTotalSupply", arity: 0, usage: "usage: mlchain getTotalSupply" },
    VerbSpec { name: "getAllowance", arity: 2, usage: "usage: mlchain getAllowance 'owner' 'spender'" },
];

/// Look up a verb by name.
pub fn lookup(name: &str) -> Option<&'static VerbSpec> {
    VERBS.iter().find(|v| v.name == name)
}

/// Every usage line, one per line.
pub fn all_usages() -> String {
    VERBS.iter().map(|v| v.usage).collect::<Vec<_>>().join("\n")
}

/// A fully parsed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Enroll { user: IdentityName },
    EnrollUser { user: IdentityName, secret: String },
    EnrollAdmins,
    GetClientId { wallet_user: IdentityName },
    Buy { client_id: String, amount: u64 },
    RequestRole { client_id: String, role: String },
    GetBalance { client_id: String },
    GetTotalSupply,
    GetAllowance { owner: String, spender: String },
    Transfer { wallet_user: IdentityName, to: String, amount: u64 },
    Approve { wallet_user: IdentityName, spender: String, amount: u64 },
    TransferFrom { wallet_user: IdentityName, from: String, to: String, amount: u64 },
    Submit {
        wallet_user: IdentityName,
        model: String,
        cid: String,
        input_def: PathBuf,
        output_def: PathBuf,
    },
    Authorize { wallet_user: IdentityName, model: String, user: String },
    Execute { wallet_user: IdentityName, model: String, input: PathBuf },
    GetModel { name: String },
    GetAllModels,
    GetModelsByUser { client_id: String },
}

/// Result of matching the command line against the verb table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// Ready to run.
    Run(Command),
    /// Print `text` and exit with `exit_code` without running anything.
    Usage { text: String, exit_code: u8 },
    /// Arguments had the right count but failed validation.
    Invalid { usage: &'static str, error: ValidationError },
}

/// Match `verb` and `args` against the table.
pub fn parse(verb: Option<&str>, args: &[String]) -> Parsed {
    let Some(verb) = verb else {
        return Parsed::Usage {
            text: all_usages(),
            exit_code: 0,
        };
    };
    let Some(spec) = lookup(verb) else {
        return Parsed::Usage {
            text: all_usages(),
            exit_code: 1,
        };
    };
    if args.len() != spec.arity {
        return Parsed::Usage {
            text: spec.usage.to_string(),
            exit_code: 1,
        };
    }
    match build(spec.name, args) {
        Ok(command) => Parsed::Run(command),
        Err(error) => Parsed::Invalid {
            usage: spec.usage,
            error,
        },
    }
}

fn user(raw: &str) -> Result<IdentityName, ValidationError> {
    IdentityName::new(raw)
}

fn text(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(raw.to_string())
}

/// Arity is already checked.
fn build(verb: &str, a: &[String]) -> Result<Command, ValidationError> {
    Ok(match verb {
        "enroll" => Command::Enroll { user: user(&a[0])? },
        "enrollUser" => Command::EnrollUser {
            user: user(&a[0])?,
            secret: text("secret", &a[1])?,
        },
        "enrollAdmins" => Command::EnrollAdmins,
        "getClientID" => Command::GetClientId { wallet_user: user(&a[0])? },
        "buy" => Command::Buy {
            client_id: text("clientID", &a[0])?,
            amount: parse_amount(&a[1])?,
        },
        "requestRole" => Command::RequestRole {
            client_id: text("clientID", &a[0])?,
            role: text("role", &a[1])?,
        },
        "getBalance" => Command::GetBalance { client_id: text("clientID", &a[0])? },
        "getTotalSupply" => Command::GetTotalSupply,
        "getAllowance" => Command::GetAllowance {
            owner: text("owner", &a[0])?,
            spender: text("spender", &a[1])?,
        },
        "transfer" => Command::Transfer {
            wallet_user: user(&a[0])?,
            to: text("to", &a[1])?,
            amount: parse_amount(&a[2])?,
        },
        "approve" => Command::Approve {
            wallet_user: user(&a[0])?,
            spender: text("spender", &a[1])?,
            amount: parse_amount(&a[2])?,
        },
        "transferFrom" => Command::TransferFrom {
            wallet_user: user(&a[0])?,
            from: text("from", &a[1])?,
            to: text("to", &a[2])?,
            amount: parse_amount(&a[3])?,
        },
        "submit" => Command::Submit {
            wallet_user: user(&a[0])?,
            model: text("modelName", &a[1])?,
            cid: text("ipfsHash", &a[2])?,
            input_def: PathBuf::from(&a[3]),
            output_def: PathBuf::from(&a[4]),
        },
        "authorize" => Command::Authorize {
            wallet_user: user(&a[0])?,
            model: text("modelName", &a[1])?,
            user: text("userToAuthorize", &a[2])?,
        },
        "execute" => Command::Execute {
            wallet_user: user(&a[0])?,
            model: text("modelName", &a[1])?,
            input: PathBuf::from(&a[2]),
        },
        "getModel" => Command::GetModel { name: text("modelName", &a[0])? },
        "getAllModels" => Command::GetAllModels,
        "getModelsByUser" => Command::GetModelsByUser { client_id: text("clientID", &a[0])? },
        other => return Err(ValidationError::InvalidField("verb", other.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn every_verb_has_a_builder() {
        for spec in VERBS {
            let filler = args(&vec!["1"; spec.arity]);
            let parsed = parse(Some(spec.name), &filler);
            assert!(
                !matches!(parsed, Parsed::Invalid { error: ValidationError::InvalidField("verb", _), .. }),
                "{} has no builder",
                spec.name
            );
        }
    }

    #[test]
    fn verb_names_are_unique() {
        let mut names: Vec<_> = VERBS.iter().map(|v| v.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), VERBS.len());
    }

    #[test]
    fn no_verb_prints_everything_and_succeeds() {
        match parse(None, &[]) {
            Parsed::Usage { text, exit_code } => {
                assert_eq!(exit_code, 0);
                assert_eq!(text.lines().count(), VERBS.len());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_verb_prints_everything_and_fails() {
        match parse(Some("mine"), &[]) {
            Parsed::Usage { exit_code, .. } => assert_eq!(exit_code, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn arity_mismatch_prints_verb_usage() {
        let parsed = parse(Some("transfer"), &args(&["alice", "bob"]));
        assert_eq!(
            parsed,
            Parsed::Usage {
                text: "usage: mlchain transfer 'walletUser' 'to' 'amount'".into(),
                exit_code: 1,
            }
        );
    }

    #[test]
    fn transfer_from_takes_four_arguments() {
        let parsed = parse(Some("transferFrom"), &args(&["alice", "carol", "dave", "5"]));
        assert!(matches!(parsed, Parsed::Run(Command::TransferFrom { amount: 5, .. })));
    }

    #[test]
    fn bad_amount_is_invalid() {
        let parsed = parse(Some("buy"), &args(&["x509::alice", "ten"]));
        assert!(matches!(
            parsed,
            Parsed::Invalid {
                error: ValidationError::InvalidAmount(_),
                ..
            }
        ));
    }
}
