//! Deployment method normalization.
//!
//! A project's free-text deployment method ("Hybrid (Training On-Prem)",
//! "Fully Managed Cloud", ...) is reduced to one of a fixed set of
//! categories. The category then selects an architecture template slide
//! through [`crate::policy::ArchitectureTable`].

use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Normalized classification of a project's infrastructure placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentCategory {
    Cloud,
    OnPremise,
    Hybrid,
    HybridTrainingOnPrem,
    FourGVpnBridge,
    Vimov,
}

impl DeploymentCategory {
    /// The canonical key used in the architecture template table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::OnPremise => "on-premise",
            Self::Hybrid => "hybrid",
            Self::HybridTrainingOnPrem => "hybrid-training-on-prem",
            Self::FourGVpnBridge => "4g-vpn-bridge",
            Self::Vimov => "vimov",
        }
    }
}

impl fmt::Display for DeploymentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of normalizing a free-text deployment method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentMethod {
    /// The text matched one of the known categories.
    Category(DeploymentCategory),
    /// No rule matched; carries the lowercased text unchanged.
    Unmatched(String),
}

impl DeploymentMethod {
    /// Normalize free text into a deployment method.
    ///
    /// Returns `None` for empty or whitespace-only input, which callers treat
    /// as "no deployment method known".
    ///
    /// Rules are checked in order, first match wins:
    /// - contains `cloud` → `cloud`
    /// - contains `hybrid`, `training` and `on-prem`/`onprem` → `hybrid-training-on-prem`
    /// - contains `hybrid` → `hybrid`
    /// - contains `on-prem`/`onprem` → `on-premise`
    /// - contains `4g` or `vpn` → `4g-vpn-bridge`
    /// - contains `vimov` → `vimov`
    pub fn normalize(text: &str) -> Option<Self> {
        let lowered = text.nfkc().collect::<String>().to_lowercase();
        if lowered.trim().is_empty() {
            return None;
        }

        let on_prem = lowered.contains("on-prem") || lowered.contains("onprem");

        let category = if lowered.contains("cloud") {
            Some(DeploymentCategory::Cloud)
        } else if lowered.contains("hybrid") {
            if lowered.contains("training") && on_prem {
                Some(DeploymentCategory::HybridTrainingOnPrem)
            } else {
                Some(DeploymentCategory::Hybrid)
            }
        } else if on_prem {
            Some(DeploymentCategory::OnPremise)
        } else if lowered.contains("4g") || lowered.contains("vpn") {
            Some(DeploymentCategory::FourGVpnBridge)
        } else if lowered.contains("vimov") {
            Some(DeploymentCategory::Vimov)
        } else {
            None
        };

        Some(match category {
            Some(category) => Self::Category(category),
            None => Self::Unmatched(lowered),
        })
    }

    /// The key looked up in the architecture template table.
    pub fn key(&self) -> &str {
        match self {
            Self::Category(category) => category.as_str(),
            Self::Unmatched(raw) => raw,
        }
    }
}

impl fmt::Display for DeploymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hybrid_training_on_prem() {
        assert_eq!(
            DeploymentMethod::normalize("Hybrid (Training On-Prem)"),
            Some(DeploymentMethod::Category(
                DeploymentCategory::HybridTrainingOnPrem
            ))
        );
        assert_eq!(
            DeploymentMethod::normalize("hybrid, onprem training"),
            Some(DeploymentMethod::Category(
                DeploymentCategory::HybridTrainingOnPrem
            ))
        );
    }

    #[test]
    fn test_cloud_wins_over_everything() {
        assert_eq!(
            DeploymentMethod::normalize("Fully Managed Cloud"),
            Some(DeploymentMethod::Category(DeploymentCategory::Cloud))
        );
        // "cloud" is checked first, so a hybrid cloud is still cloud
        assert_eq!(
            DeploymentMethod::normalize("Hybrid Cloud"),
            Some(DeploymentMethod::Category(DeploymentCategory::Cloud))
        );
    }

    #[test]
    fn test_plain_hybrid_and_on_premise() {
        assert_eq!(
            DeploymentMethod::normalize("Hybrid"),
            Some(DeploymentMethod::Category(DeploymentCategory::Hybrid))
        );
        assert_eq!(
            DeploymentMethod::normalize("Hybrid with on-prem inference"),
            Some(DeploymentMethod::Category(DeploymentCategory::Hybrid))
        );
        assert_eq!(
            DeploymentMethod::normalize("On-Premise"),
            Some(DeploymentMethod::Category(DeploymentCategory::OnPremise))
        );
        assert_eq!(
            DeploymentMethod::normalize("Onprem servers"),
            Some(DeploymentMethod::Category(DeploymentCategory::OnPremise))
        );
    }

    #[test]
    fn test_bridge_and_vimov() {
        assert_eq!(
            DeploymentMethod::normalize("4G router"),
            Some(DeploymentMethod::Category(DeploymentCategory::FourGVpnBridge))
        );
        assert_eq!(
            DeploymentMethod::normalize("Site VPN bridge"),
            Some(DeploymentMethod::Category(DeploymentCategory::FourGVpnBridge))
        );
        assert_eq!(
            DeploymentMethod::normalize("viMOV"),
            Some(DeploymentMethod::Category(DeploymentCategory::Vimov))
        );
    }

    #[test]
    fn test_unmatched_passes_through_lowercased() {
        let method = DeploymentMethod::normalize("LoRaWAN Mesh").unwrap();
        assert_eq!(method, DeploymentMethod::Unmatched("lorawan mesh".to_string()));
        assert_eq!(method.key(), "lorawan mesh");
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(DeploymentMethod::normalize(""), None);
        assert_eq!(DeploymentMethod::normalize("   "), None);
    }

    #[test]
    fn test_fullwidth_text_is_normalized() {
        // NFKC folds full-width letters before matching
        assert_eq!(
            DeploymentMethod::normalize("ＣＬＯＵＤ"),
            Some(DeploymentMethod::Category(DeploymentCategory::Cloud))
        );
    }
}
