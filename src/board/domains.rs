use super::{Board, required_text};
use crate::error::{ApiError, ApiResult};
use crate::policy::{Action, Actor};
use crate::types::Domain;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDomainInput {
    pub name: Option<String>,
}

impl Board {
    pub fn list_domains(&self, _actor: &Actor) -> ApiResult<Vec<Domain>> {
        Ok(self.db.list_domains()?)
    }

    pub fn create_domain(&self, actor: &Actor, input: CreateDomainInput) -> ApiResult<Domain> {
        self.policy.check(actor, Action::ManageDomains)?;
        let name = required_text("name", input.name.as_deref())?;
        let domain = self.db.create_domain(&name)?;
        info!(domain_id = %domain.id, name = %domain.name, "Created domain");
        Ok(domain)
    }

    /// Delete a domain. Refused while any task uses it.
    pub fn delete_domain(&self, actor: &Actor, domain_id: &str) -> ApiResult<()> {
        self.policy.check(actor, Action::ManageDomains)?;
        if !self.db.delete_domain(domain_id)? {
            return Err(ApiError::not_found("domain"));
        }
        info!(domain_id, "Deleted domain");
        Ok(())
    }
}
