//! Kind-specific node payloads.
//!
//! `NodePayload` is a tagged sum with one variant per [`NodeKind`], so a
//! node's kind is read off its payload and the two can never disagree.
//! Everything here is serde-serializable in camelCase and crosses the JS
//! boundary through `serde-wasm-bindgen`.

use serde::{Deserialize, Serialize};

use super::node::NodeKind;

// ============================================================================
// Strategic payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductAnalysis {
    pub name: String,
    pub key_benefit: String,
}

/// Creative DNA extracted from the reference ad.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdDna {
    pub sales_mechanism: String,
    pub copy_pattern: String,
    pub persuasion_formula: String,
    pub specific_language_patterns: Vec<String>,
    pub tone_of_voice: String,
    pub social_proof_elements: String,
    pub objection_handling: String,
    pub visual_style: String,
    pub target_country: String,
    pub offer_summary: String,
    pub cta: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetPersona {
    pub description: String,
    pub pain_points: Vec<String>,
    pub desired_outcomes: Vec<String>,
    pub age: String,
    pub creator_type: String,
}

/// The campaign brief held by the root node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignBlueprint {
    pub product_analysis: ProductAnalysis,
    pub target_persona: TargetPersona,
    pub ad_dna: AdDna,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PainDesireType {
    Pain,
    Desire,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PainDesire {
    #[serde(rename = "type")]
    pub kind: PainDesireType,
    pub name: String,
    pub description: String,
    pub emotional_impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objection {
    pub name: String,
    pub description: String,
    pub counter_angle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub name: String,
    pub description: String,
    pub psychological_principle: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AwarenessStage {
    Unaware,
    ProblemAware,
    SolutionAware,
    ProductAware,
}

impl AwarenessStage {
    pub const ALL: [AwarenessStage; 4] = [
        AwarenessStage::Unaware,
        AwarenessStage::ProblemAware,
        AwarenessStage::SolutionAware,
        AwarenessStage::ProductAware,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AwarenessStage::Unaware => "Unaware",
            AwarenessStage::ProblemAware => "Problem Aware",
            AwarenessStage::SolutionAware => "Solution Aware",
            AwarenessStage::ProductAware => "Product Aware",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Angle {
    pub text: String,
}

impl Angle {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A psychological buying trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyingTrigger {
    pub name: String,
    pub description: String,
    pub example: String,
    /// Why the example works.
    pub analysis: String,
}

// ============================================================================
// Static enumerations
// ============================================================================

/// Creative formats, in the order a trigger expands into them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreativeFormat {
    #[serde(rename = "UGC")]
    Ugc,
    #[serde(rename = "Article Ad")]
    ArticleAd,
    Advertorial,
    Testimonial,
    Storytelling,
    #[serde(rename = "Problem/Solution")]
    ProblemSolution,
    #[serde(rename = "Education/Tips")]
    EducationTips,
    #[serde(rename = "Before & After")]
    BeforeAfter,
    Demo,
    Comparison,
    #[serde(rename = "Direct Offer")]
    DirectOffer,
    Listicle,
    #[serde(rename = "Split Screen")]
    SplitScreen,
    #[serde(rename = "Multi-Product")]
    MultiProduct,
    #[serde(rename = "Us vs Them")]
    UsVsThem,
    #[serde(rename = "Meme/Ugly Ad")]
    MemeUglyAd,
}

impl CreativeFormat {
    pub const ALL: [CreativeFormat; 16] = [
        CreativeFormat::Ugc,
        CreativeFormat::ArticleAd,
        CreativeFormat::Advertorial,
        CreativeFormat::Testimonial,
        CreativeFormat::Storytelling,
        CreativeFormat::ProblemSolution,
        CreativeFormat::EducationTips,
        CreativeFormat::BeforeAfter,
        CreativeFormat::Demo,
        CreativeFormat::Comparison,
        CreativeFormat::DirectOffer,
        CreativeFormat::Listicle,
        CreativeFormat::SplitScreen,
        CreativeFormat::MultiProduct,
        CreativeFormat::UsVsThem,
        CreativeFormat::MemeUglyAd,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CreativeFormat::Ugc => "UGC",
            CreativeFormat::ArticleAd => "Article Ad",
            CreativeFormat::Advertorial => "Advertorial",
            CreativeFormat::Testimonial => "Testimonial",
            CreativeFormat::Storytelling => "Storytelling",
            CreativeFormat::ProblemSolution => "Problem/Solution",
            CreativeFormat::EducationTips => "Education/Tips",
            CreativeFormat::BeforeAfter => "Before & After",
            CreativeFormat::Demo => "Demo",
            CreativeFormat::Comparison => "Comparison",
            CreativeFormat::DirectOffer => "Direct Offer",
            CreativeFormat::Listicle => "Listicle",
            CreativeFormat::SplitScreen => "Split Screen",
            CreativeFormat::MultiProduct => "Multi-Product",
            CreativeFormat::UsVsThem => "Us vs Them",
            CreativeFormat::MemeUglyAd => "Meme/Ugly Ad",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    Carousel,
    #[serde(rename = "Instagram Story")]
    InstagramStory,
    #[serde(rename = "Instagram Feed")]
    InstagramFeed,
}

impl Placement {
    pub const ALL: [Placement; 3] = [
        Placement::Carousel,
        Placement::InstagramStory,
        Placement::InstagramFeed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Placement::Carousel => "Carousel",
            Placement::InstagramStory => "Instagram Story",
            Placement::InstagramFeed => "Instagram Feed",
        }
    }
}

// ============================================================================
// Creative results
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarouselSlide {
    pub slide_number: u32,
    pub visual_prompt: String,
    pub headline: String,
    pub hook: String,
    pub description: String,
}

/// Image rendering state of a creative.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RenderStatus {
    #[default]
    Idle,
    Rendering,
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PerformanceStatus {
    #[default]
    Pending,
    Testing,
    Winner,
    Failed,
}

/// Numbers reported back from the ad platform.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceData {
    pub ctr: Option<f64>,
    pub cpc: Option<f64>,
    pub roas: Option<f64>,
    pub status: PerformanceStatus,
}

/// A generated ad concept.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreativeConcept {
    pub headline: String,
    pub hook: String,
    pub angle: String,
    pub visual_prompt: String,
    pub ad_set_name: String,
    pub visual_vehicle: String,
    pub entry_point: String,
    pub carousel_arc: Option<String>,
    pub carousel_slides: Vec<CarouselSlide>,
    pub image_urls: Vec<String>,
    pub render: RenderStatus,
    pub performance: Option<PerformanceData>,
}

// ============================================================================
// NodePayload
// ============================================================================

/// Kind-specific data of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum NodePayload {
    RootBrief(CampaignBlueprint),
    Persona(TargetPersona),
    PainOrDesire(PainDesire),
    Objection(Objection),
    Offer(Offer),
    AwarenessStage(AwarenessStage),
    Angle(Angle),
    Trigger(BuyingTrigger),
    Format(CreativeFormat),
    Placement(Placement),
    CreativeResult(Box<CreativeConcept>),
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::RootBrief(_) => NodeKind::RootBrief,
            NodePayload::Persona(_) => NodeKind::Persona,
            NodePayload::PainOrDesire(_) => NodeKind::PainOrDesire,
            NodePayload::Objection(_) => NodeKind::Objection,
            NodePayload::Offer(_) => NodeKind::Offer,
            NodePayload::AwarenessStage(_) => NodeKind::AwarenessStage,
            NodePayload::Angle(_) => NodeKind::Angle,
            NodePayload::Trigger(_) => NodeKind::Trigger,
            NodePayload::Format(_) => NodeKind::Format,
            NodePayload::Placement(_) => NodeKind::Placement,
            NodePayload::CreativeResult(_) => NodeKind::CreativeResult,
        }
    }

    /// Short display string for the node card.
    pub fn label(&self) -> String {
        match self {
            NodePayload::RootBrief(blueprint) => blueprint.product_analysis.name.clone(),
            NodePayload::Persona(persona) => persona.description.clone(),
            NodePayload::PainOrDesire(pd) => pd.name.clone(),
            NodePayload::Objection(objection) => objection.name.clone(),
            NodePayload::Offer(offer) => offer.name.clone(),
            NodePayload::AwarenessStage(stage) => stage.name().to_owned(),
            NodePayload::Angle(angle) => angle.text.clone(),
            NodePayload::Trigger(trigger) => trigger.name.clone(),
            NodePayload::Format(format) => format.name().to_owned(),
            NodePayload::Placement(placement) => placement.name().to_owned(),
            NodePayload::CreativeResult(concept) => concept.headline.clone(),
        }
    }

    /// Detail lines shown in the hover tooltip.
    pub fn summary_lines(&self) -> Vec<String> {
        match self {
            NodePayload::RootBrief(blueprint) => vec![
                format!("Key benefit: {}", blueprint.product_analysis.key_benefit),
                format!("Target: {}", blueprint.target_persona.description),
                format!("Offer: {}", blueprint.ad_dna.offer_summary),
            ],
            NodePayload::Persona(persona) => {
                let mut lines = vec![
                    format!("Age: {}", persona.age),
                    format!("Creator: {}", persona.creator_type),
                ];
                if !persona.pain_points.is_empty() {
                    lines.push(format!("Pains: {}", persona.pain_points.join(", ")));
                }
                if !persona.desired_outcomes.is_empty() {
                    lines.push(format!("Wants: {}", persona.desired_outcomes.join(", ")));
                }
                lines
            }
            NodePayload::PainOrDesire(pd) => vec![
                format!("{:?}", pd.kind),
                pd.description.clone(),
                format!("Emotional impact: {}", pd.emotional_impact),
            ],
            NodePayload::Objection(objection) => vec![
                objection.description.clone(),
                format!("Counter: {}", objection.counter_angle),
            ],
            NodePayload::Offer(offer) => vec![
                offer.description.clone(),
                format!("Principle: {}", offer.psychological_principle),
            ],
            NodePayload::AwarenessStage(stage) => vec![format!("Awareness: {}", stage.name())],
            NodePayload::Angle(angle) => vec![angle.text.clone()],
            NodePayload::Trigger(trigger) => vec![
                trigger.description.clone(),
                format!("Example: {}", trigger.example),
                format!("Why it works: {}", trigger.analysis),
            ],
            NodePayload::Format(format) => vec![format!("Format: {}", format.name())],
            NodePayload::Placement(placement) => vec![format!("Placement: {}", placement.name())],
            NodePayload::CreativeResult(concept) => {
                let mut lines = vec![
                    format!("Hook: {}", concept.hook),
                    format!("Ad set: {}", concept.ad_set_name),
                ];
                match &concept.render {
                    RenderStatus::Idle => {}
                    RenderStatus::Rendering => lines.push("Rendering...".to_owned()),
                    RenderStatus::Failed { message } => {
                        lines.push(format!("Render failed: {message}"))
                    }
                }
                if let Some(perf) = &concept.performance {
                    lines.push(format!("Status: {:?}", perf.status));
                }
                lines
            }
        }
    }

    pub fn as_creative(&self) -> Option<&CreativeConcept> {
        match self {
            NodePayload::CreativeResult(concept) => Some(concept.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn as_creative_mut(&mut self) -> Option<&mut CreativeConcept> {
        match self {
            NodePayload::CreativeResult(concept) => Some(concept.as_mut()),
            _ => None,
        }
    }
}

impl From<CreativeConcept> for NodePayload {
    fn from(concept: CreativeConcept) -> Self {
        NodePayload::CreativeResult(Box::new(concept))
    }
}
