#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Function, Reflect};
use strategy_graph_wasm::StrategyGraphWasm;
use strategy_graph_wasm::graph::{CampaignBlueprint, ProductAnalysis};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::wasm_bindgen_test;

fn blueprint() -> JsValue {
    let blueprint = CampaignBlueprint {
        product_analysis: ProductAnalysis {
            name: "Dreamy".into(),
            key_benefit: "Deeper sleep".into(),
        },
        ..Default::default()
    };
    serde_wasm_bindgen::to_value(&blueprint).unwrap()
}

/// Answers every request with two personas.
fn persona_provider() -> Function {
    Function::new_with_args(
        "kind, context",
        "return Promise.resolve([
            { description: kind + ' for ' + context.blueprint.productAnalysis.name, age: '25-34' },
            { description: 'night owl', age: '35-44' },
        ]);",
    )
}

fn graph(generate: Function) -> StrategyGraphWasm {
    StrategyGraphWasm::new(blueprint(), JsValue::UNDEFINED, generate, None).unwrap()
}

#[wasm_bindgen_test]
async fn test_toggle_root_generates_personas() {
    let graph = graph(persona_provider());
    let root = graph.root_id().unwrap();

    let state = JsFuture::from(graph.toggle(root, JsValue::UNDEFINED))
        .await
        .unwrap();
    assert_eq!(state.as_string().as_deref(), Some("expandedLoaded"));
    assert_eq!(graph.node_count(), 3);
    assert!(!graph.is_generating());

    let frame = graph.frame(JsValue::UNDEFINED).unwrap();
    let nodes: Array = Reflect::get(&frame, &"nodes".into()).unwrap().into();
    assert_eq!(nodes.length(), 3);
}

#[wasm_bindgen_test]
async fn test_rejected_promise_sets_notice() {
    let failing = Function::new_with_args("", "return Promise.reject(new Error('quota exceeded'));");
    let graph = graph(failing);
    let root = graph.root_id().unwrap();

    let err = JsFuture::from(graph.toggle(root, JsValue::UNDEFINED))
        .await
        .unwrap_err();
    let message = Reflect::get(&err, &"message".into()).unwrap();
    assert_eq!(
        message.as_string().as_deref(),
        Some("generation failed: quota exceeded")
    );
    assert_eq!(graph.node_count(), 1);
    assert_eq!(
        graph.notice().as_deref(),
        Some("generation failed: quota exceeded")
    );
    graph.dismiss_notice();
    assert!(graph.notice().is_none());
}

#[wasm_bindgen_test]
async fn test_undecodable_answer_is_rejected() {
    let garbage = Function::new_with_args("", "return 42;");
    let graph = graph(garbage);
    let root = graph.root_id().unwrap();

    assert!(
        JsFuture::from(graph.toggle(root, JsValue::UNDEFINED))
            .await
            .is_err()
    );
    assert_eq!(graph.node_count(), 1);
}

#[wasm_bindgen_test]
fn test_pointer_over_root_reports_it() {
    let graph = graph(persona_provider());
    graph.resize(1280.0, 800.0);
    graph.recenter().unwrap();

    assert_eq!(graph.pointer_down(640.0, 400.0), graph.root_id());
    graph.pointer_up();
    assert_eq!(graph.pointer_down(2.0, 2.0), None);
    assert!(graph.pointer_move(12.0, 12.0));
    graph.pointer_up();
}

#[wasm_bindgen_test]
fn test_add_persona_skips_the_provider() {
    let never = Function::new_with_args("", "throw new Error('provider called');");
    let graph = graph(never);
    let persona = serde_wasm_bindgen::to_value(&strategy_graph_wasm::graph::TargetPersona {
        description: "Shift nurse".into(),
        ..Default::default()
    })
    .unwrap();

    let id = graph.add_persona(persona).unwrap();
    assert_eq!(graph.node_count(), 2);
    assert_ne!(Some(id), graph.root_id());
    assert!(graph.add_persona(JsValue::from(7)).is_err());
}
