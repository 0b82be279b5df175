//! Published-key grammar and entity-role classification.
//!
//! Every record the daemons publish is keyed either by a unit name
//! (which must carry one of the recognized role prefixes) or by the
//! chassis summary key template. Classification is pure string
//! inspection so it can guard both the publish path and the config
//! event path without touching the platform.

use std::fmt;

/// Field name for the unit description.
pub const FIELD_DESC: &str = "desc";

/// Field name for the unit slot number.
pub const FIELD_SLOT: &str = "slot";

/// Field name for the observed operational status.
pub const FIELD_OPER_STATUS: &str = "oper_status";

/// Field name for the commanded admin state.
pub const FIELD_ADMIN_STATUS: &str = "admin_status";

/// Field name for the total unit count in the chassis summary record.
pub const FIELD_MODULE_COUNT: &str = "module_num";

/// Role a unit plays in the chassis, derived from its name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleRole {
    /// Control-plane supervisor card.
    Supervisor,

    /// Forwarding line card.
    LineCard,

    /// Fabric interconnect card.
    FabricCard,
}

impl ModuleRole {
    /// The name prefix identifying this role.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Supervisor => "SUPERVISOR",
            Self::LineCard => "LINE-CARD",
            Self::FabricCard => "FABRIC-CARD",
        }
    }

    /// Classifies a unit name by its role prefix.
    ///
    /// Returns `None` for names that carry no recognized prefix; such
    /// names must never be published or forwarded to the platform.
    pub fn of(name: &str) -> Option<Self> {
        [Self::Supervisor, Self::LineCard, Self::FabricCard]
            .into_iter()
            .find(|role| name.starts_with(role.prefix()))
    }
}

impl fmt::Display for ModuleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Builds the chassis summary key, e.g. `CHASSIS 1`.
pub fn chassis_key(index: u32) -> String {
    format!("CHASSIS {index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_classification() {
        assert_eq!(ModuleRole::of("SUPERVISOR0"), Some(ModuleRole::Supervisor));
        assert_eq!(ModuleRole::of("LINE-CARD3"), Some(ModuleRole::LineCard));
        assert_eq!(ModuleRole::of("FABRIC-CARD1"), Some(ModuleRole::FabricCard));
    }

    #[test]
    fn test_role_rejects_unrecognized() {
        assert_eq!(ModuleRole::of("PSU0"), None);
        assert_eq!(ModuleRole::of(""), None);
        assert_eq!(ModuleRole::of("line-card0"), None);
        assert_eq!(ModuleRole::of("XLINE-CARD0"), None);
    }

    #[test]
    fn test_role_prefix_roundtrip() {
        for role in [
            ModuleRole::Supervisor,
            ModuleRole::LineCard,
            ModuleRole::FabricCard,
        ] {
            assert_eq!(ModuleRole::of(role.prefix()), Some(role));
        }
    }

    #[test]
    fn test_chassis_key_template() {
        assert_eq!(chassis_key(1), "CHASSIS 1");
    }
}
