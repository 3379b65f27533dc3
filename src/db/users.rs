//! Types for the user directory.

/// A registered employee.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl User {
    /// Label shown in the check-in picker: "Maria Silva — Produção".
    pub fn display_label(&self) -> String {
        match self.role.as_deref() {
            Some(role) if !role.is_empty() => format!("{} — {}", self.name, role),
            _ => self.name.clone(),
        }
    }
}

/// Registration form input, normalized before it touches the database.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Registration {
    /// Trim all fields, drop empty optionals, lower-case the email.
    /// Returns `None` when the required name is empty.
    pub fn normalized(name: &str, role: &str, phone: &str, email: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            role: non_empty(role),
            phone: non_empty(phone),
            email: non_empty(email).map(|e| e.to_lowercase()),
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_trims_and_lowercases() {
        let reg = Registration::normalized("  Ana Silva ", " Produção ", "", " Ana@X.Com ").unwrap();
        assert_eq!(reg.name, "Ana Silva");
        assert_eq!(reg.role.as_deref(), Some("Produção"));
        assert_eq!(reg.phone, None);
        assert_eq!(reg.email.as_deref(), Some("ana@x.com"));
    }

    #[test]
    fn test_normalized_rejects_empty_name() {
        assert!(Registration::normalized("   ", "x", "y", "z").is_none());
    }

    #[test]
    fn test_display_label() {
        let user = User {
            id: 1,
            name: "Maria".into(),
            role: Some("Produção".into()),
            phone: None,
            email: None,
        };
        assert_eq!(user.display_label(), "Maria — Produção");

        let no_role = User { role: None, ..user };
        assert_eq!(no_role.display_label(), "Maria");
    }
}
