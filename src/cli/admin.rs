//! Admin commands that run against the database without the HTTP server.

use crate::config::Config;
use crate::db::Database;
use crate::types::Role;
use anyhow::{Result, anyhow};
use clap::Args;

/// Arguments for the set-role command.
#[derive(Args, Debug)]
pub struct SetRoleArgs {
    /// Email of the registered user.
    #[arg(long)]
    pub email: String,

    /// New role: member, team_lead or manager.
    #[arg(long)]
    pub role: String,
}

/// Report the schema version after `Database::open` has migrated.
pub fn run_migrate(db: &Database) -> Result<()> {
    match db.schema_version()? {
        Some(version) => println!("Database schema is at version {}.", version),
        None => println!("No migrations recorded."),
    }
    Ok(())
}

pub fn run_seed_domains(db: &Database, config: &Config) -> Result<()> {
    let inserted = db.seed_domains(&config.domains.seed)?;
    println!(
        "Inserted {} of {} configured domains.",
        inserted,
        config.domains.seed.len()
    );
    Ok(())
}

/// Promote or demote a user. The first manager has to be created this way.
pub fn run_set_role(db: &Database, args: &SetRoleArgs) -> Result<()> {
    let role = Role::from_str(args.role.trim()).ok_or_else(|| {
        anyhow!(
            "invalid role '{}', expected one of: {}",
            args.role,
            Role::ALL.map(|r| r.as_str()).join(", ")
        )
    })?;
    let email = args.email.trim().to_lowercase();
    match db.set_user_role_by_email(&email, role)? {
        Some(user) => {
            println!("{} is now {}.", user.email, user.role);
            Ok(())
        }
        None => Err(anyhow!("no user registered with email '{}'", email)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_role_promotes_registered_user() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("ada@example.com", Some("Ada"), "hash").unwrap();

        let args = SetRoleArgs {
            email: "ADA@example.com".into(),
            role: "manager".into(),
        };
        run_set_role(&db, &args).unwrap();

        let (user, _) = db.find_credentials("ada@example.com").unwrap().unwrap();
        assert_eq!(user.role, Role::Manager);
    }

    #[test]
    fn set_role_rejects_unknown_role_and_user() {
        let db = Database::open_in_memory().unwrap();
        let bad_role = SetRoleArgs {
            email: "nobody@example.com".into(),
            role: "admin".into(),
        };
        assert!(run_set_role(&db, &bad_role).is_err());

        let missing = SetRoleArgs {
            email: "nobody@example.com".into(),
            role: "manager".into(),
        };
        assert!(run_set_role(&db, &missing).is_err());
    }
}
