//! Imaging gate
//!
//! Separates acquisition images from derived or non-image objects so that only the
//! former are written when `imaging_only` is enabled.

use crate::domain::tag::Tag;
use crate::domain::tree::AttributeTree;

pub const MODALITY: Tag = Tag::new(0x0008, 0x0060);
pub const SOP_CLASS_UID: Tag = Tag::new(0x0008, 0x0016);
pub const SERIES_DESCRIPTION: Tag = Tag::new(0x0008, 0x103E);
pub const IMAGE_TYPE: Tag = Tag::new(0x0008, 0x0008);

/// Modalities treated as imaging
pub const IMAGING_MODALITIES: [&str; 5] = ["CT", "MR", "NM", "PT", "ST"];

/// SOP classes excluded even under an imaging modality
pub const EXCLUDED_SOP_CLASSES: [(&str, &str); 3] = [
    (
        "1.2.840.10008.5.1.4.1.1.11.1",
        "Grayscale Softcopy Presentation State Storage",
    ),
    ("1.2.840.10008.5.1.4.1.1.66", "Raw Data Storage"),
    ("1.2.840.10008.5.1.4.1.1.7", "Secondary Capture Image Storage"),
];

/// Gate verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Imaging,
    NotImaging { reason: String },
}

impl Classification {
    pub fn is_imaging(&self) -> bool {
        matches!(self, Classification::Imaging)
    }
}

/// Modality classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagingGate;

impl ImagingGate {
    /// Classifies the root dataset of `tree`
    pub fn classify(tree: &AttributeTree) -> Classification {
        let root = tree.root();
        let modality = tree.string(root, MODALITY).unwrap_or_default();
        if !IMAGING_MODALITIES.contains(&modality) {
            return Classification::NotImaging {
                reason: format!("modality '{modality}' is not an imaging modality"),
            };
        }

        if let Some(sop_class) = tree.string(root, SOP_CLASS_UID) {
            if let Some((_, name)) = EXCLUDED_SOP_CLASSES
                .iter()
                .find(|(uid, _)| *uid == sop_class)
            {
                return Classification::NotImaging {
                    reason: format!("SOP class {name} is excluded"),
                };
            }
        }
        Classification::Imaging
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tree::Element;
    use crate::domain::vr::Vr;
    use test_case::test_case;

    fn tree(modality: Option<&str>, sop_class: &str) -> AttributeTree {
        let mut tree = AttributeTree::new();
        let root = tree.root();
        if let Some(modality) = modality {
            tree.insert(root, Element::text(MODALITY, Vr::CS, modality));
        }
        tree.insert(root, Element::text(SOP_CLASS_UID, Vr::UI, sop_class));
        tree
    }

    #[test_case(Some("MR"), "1.2.840.10008.5.1.4.1.1.4", true ; "mr image")]
    #[test_case(Some("CT"), "1.2.840.10008.5.1.4.1.1.2", true ; "ct image")]
    #[test_case(Some("PT"), "1.2.840.10008.5.1.4.1.1.128", true ; "pet image")]
    #[test_case(Some("SR"), "1.2.840.10008.5.1.4.1.1.88.11", false ; "structured report")]
    #[test_case(Some("OT"), "1.2.840.10008.5.1.4.1.1.7", false ; "other modality")]
    #[test_case(Some("MR"), "1.2.840.10008.5.1.4.1.1.7", false ; "secondary capture")]
    #[test_case(Some("MR"), "1.2.840.10008.5.1.4.1.1.66", false ; "raw data")]
    #[test_case(Some("PT"), "1.2.840.10008.5.1.4.1.1.11.1", false ; "presentation state")]
    #[test_case(None, "1.2.840.10008.5.1.4.1.1.4", false ; "no modality")]
    fn test_classify(modality: Option<&str>, sop_class: &str, imaging: bool) {
        assert_eq!(ImagingGate::classify(&tree(modality, sop_class)).is_imaging(), imaging);
    }

    #[test]
    fn test_reason_names_sop_class() {
        let verdict = ImagingGate::classify(&tree(Some("MR"), "1.2.840.10008.5.1.4.1.1.66"));
        let Classification::NotImaging { reason } = verdict else {
            panic!("expected not imaging");
        };
        assert!(reason.contains("Raw Data Storage"));
    }
}
