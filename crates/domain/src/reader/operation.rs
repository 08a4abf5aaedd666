use serde::{Deserialize, Serialize};

/// Operations the library platform can invoke on the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    GetItems,
    ItemUpdate,
    SetSecurity,
    GetSecurity,
}

impl Operation {
    /// Human readable name used in failure messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::GetItems => "Get Items",
            Self::ItemUpdate => "Item Update",
            Self::SetSecurity => "Set Security",
            Self::GetSecurity => "Get Security",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_labels() {
        assert_eq!(Operation::GetItems.label(), "Get Items");
        assert_eq!(Operation::ItemUpdate.label(), "Item Update");
        assert_eq!(Operation::SetSecurity.label(), "Set Security");
        assert_eq!(Operation::GetSecurity.label(), "Get Security");
    }
}
