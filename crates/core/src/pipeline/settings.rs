//! Stage settings, derived once from the application configuration.

use autobook_shared::{EnsembleConfig, PipelineConfig};
use rust_decimal::Decimal;

/// OCR stage settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrSettings {
    /// Pages sent to the extraction service per document.
    pub max_pages: u32,
    /// Items processed per invocation unless the caller asks for fewer.
    pub batch_size: usize,
}

/// Size of an ensemble and the agreement it requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsembleSettings {
    /// Identical calls per item.
    pub calls: usize,
    /// Identical non-empty answers needed to accept a value.
    pub required: usize,
}

impl From<EnsembleConfig> for EnsembleSettings {
    fn from(config: EnsembleConfig) -> Self {
        Self {
            calls: config.calls,
            required: config.required_agreement,
        }
    }
}

/// Settings for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// OCR stage.
    pub ocr: OcrSettings,
    /// Supplier resolution ensemble (unanimous by default).
    pub supplier_ensemble: EnsembleSettings,
    /// Account classification ensemble (strict majority by default).
    pub account_ensemble: EnsembleSettings,
    /// Allowed difference between VAT lines and the payable amount.
    pub reconciliation_tolerance: Decimal,
    /// Maximum stored length of a failure message, in characters.
    pub error_message_limit: usize,
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            ocr: OcrSettings {
                max_pages: config.ocr_max_pages,
                batch_size: config.ocr_batch_size,
            },
            supplier_ensemble: config.supplier_ensemble.into(),
            account_ensemble: config.account_ensemble.into(),
            reconciliation_tolerance: config.reconciliation_tolerance,
            error_message_limit: config.error_message_limit,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_match_configuration_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.ocr, OcrSettings { max_pages: 5, batch_size: 10 });
        assert_eq!(settings.supplier_ensemble, EnsembleSettings { calls: 5, required: 5 });
        assert_eq!(settings.account_ensemble, EnsembleSettings { calls: 3, required: 2 });
        assert_eq!(settings.reconciliation_tolerance, dec!(0.02));
        assert_eq!(settings.error_message_limit, 2000);
    }

    #[test]
    fn test_default_ensembles_use_their_quorum_rules() {
        use crate::consensus::vote::{strict_majority, unanimous};

        let settings = PipelineSettings::default();
        let supplier = settings.supplier_ensemble;
        let account = settings.account_ensemble;
        assert_eq!(supplier.required, unanimous(supplier.calls));
        assert_eq!(account.required, strict_majority(account.calls));
    }
}
