use crate::record::{ParameterRecord, COMPONENT_NAME};

use super::{component_ref, ComponentError, ComponentRef, ComponentRole, Reference, TypedComponent};

/// CPE name that switches the corresponding detector off
const FAKE_CPE: &str = "Fake";

/// `TkTransientTrackingRecHitBuilderESProducer`
#[derive(Debug, Clone, PartialEq)]
pub struct RecHitBuilderConfig {
    pub component_name: String,
    pub strip_cpe: ComponentRef,
    pub pixel_cpe: ComponentRef,
    pub matcher: ComponentRef,
}

impl TypedComponent for RecHitBuilderConfig {
    fn from_record(record: &ParameterRecord) -> Result<Self, ComponentError> {
        Ok(RecHitBuilderConfig {
            component_name: record.get_str(COMPONENT_NAME)?.to_string(),
            strip_cpe: component_ref(record, "StripCPE")?,
            pixel_cpe: component_ref(record, "PixelCPE")?,
            matcher: component_ref(record, "Matcher")?,
        })
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::with_capacity(3);
        if self.strip_cpe.as_str() != FAKE_CPE {
            refs.push(Reference::new("StripCPE", &self.strip_cpe, ComponentRole::StripCpe));
        }
        if self.pixel_cpe.as_str() != FAKE_CPE {
            refs.push(Reference::new("PixelCPE", &self.pixel_cpe, ComponentRole::PixelCpe));
        }
        refs.push(Reference::new("Matcher", &self.matcher, ComponentRole::HitMatcher));
        refs
    }
}
