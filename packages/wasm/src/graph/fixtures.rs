//! Payload builders shared by the unit tests.

use super::node::NodeKind;
use super::payload::*;

pub fn blueprint(name: &str) -> CampaignBlueprint {
    CampaignBlueprint {
        product_analysis: ProductAnalysis {
            name: name.to_owned(),
            key_benefit: "Deeper sleep".to_owned(),
        },
        ..Default::default()
    }
}

pub fn creative(headline: &str) -> NodePayload {
    CreativeConcept {
        headline: headline.to_owned(),
        hook: format!("{headline}?"),
        ..Default::default()
    }
    .into()
}

/// A payload of `kind`, labelled with `n`.
pub fn payload(kind: NodeKind, n: usize) -> NodePayload {
    let name = format!("{kind} {n}");
    match kind {
        NodeKind::RootBrief => NodePayload::RootBrief(blueprint(&name)),
        NodeKind::Persona => NodePayload::Persona(TargetPersona {
            description: name,
            age: "30-40".to_owned(),
            ..Default::default()
        }),
        NodeKind::PainOrDesire => NodePayload::PainOrDesire(PainDesire {
            kind: PainDesireType::Pain,
            name,
            description: String::new(),
            emotional_impact: String::new(),
        }),
        NodeKind::Objection => NodePayload::Objection(Objection {
            name,
            description: String::new(),
            counter_angle: String::new(),
        }),
        NodeKind::Offer => NodePayload::Offer(Offer {
            name,
            description: String::new(),
            psychological_principle: String::new(),
        }),
        NodeKind::AwarenessStage => NodePayload::AwarenessStage(AwarenessStage::ALL[n % 4]),
        NodeKind::Angle => NodePayload::Angle(Angle::new(name)),
        NodeKind::Trigger => NodePayload::Trigger(BuyingTrigger {
            name,
            description: String::new(),
            example: String::new(),
            analysis: String::new(),
        }),
        NodeKind::Format => NodePayload::Format(CreativeFormat::ALL[n % 16]),
        NodeKind::Placement => NodePayload::Placement(Placement::ALL[n % 3]),
        NodeKind::CreativeResult => creative(&name),
    }
}

pub fn payloads(kind: NodeKind, count: usize) -> Vec<NodePayload> {
    (0..count).map(|n| payload(kind, n)).collect()
}
