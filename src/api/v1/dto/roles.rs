use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub name: String,
}

impl RoleRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name is required");
        }
        Ok(())
    }
}
