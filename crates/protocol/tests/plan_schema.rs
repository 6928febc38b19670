use deploy_protocol::{
    plan_schema, AssetIdentity, AssetKind, ImportPlan, ImportWarning, PlannedImport,
    RenameMapping, WarningKind,
};
use std::path::PathBuf;

fn sample_plan() -> ImportPlan {
    let original = AssetIdentity::new(AssetKind::Worksheet, "Sales/Orders");
    let target = AssetIdentity::new(AssetKind::Worksheet, "Imported/Orders");
    let mut renames = RenameMapping::new();
    renames.record(original.clone(), target.clone()).unwrap();

    ImportPlan {
        steps: vec![PlannedImport {
            original: original.clone(),
            target,
            source: PathBuf::from("assets/orders.xml"),
            cycle_broken: false,
            relocated: true,
        }],
        renames,
        warnings: vec![ImportWarning::new(
            WarningKind::MalformedIdentifier,
            Some("BogusAsset^x".to_string()),
            "unknown asset type",
        )],
        stats: Default::default(),
    }
}

#[test]
fn plan_json_uses_identifier_strings() {
    let json = serde_json::to_value(sample_plan()).expect("serialize plan");

    assert_eq!(json["steps"][0]["original"], "WorksheetAsset^Sales/Orders");
    assert_eq!(json["steps"][0]["target"], "WorksheetAsset^Imported/Orders");
    assert_eq!(
        json["renames"]["WorksheetAsset^Sales/Orders"],
        "WorksheetAsset^Imported/Orders"
    );
    assert_eq!(json["warnings"][0]["kind"], "malformed_identifier");

    let back: ImportPlan = serde_json::from_value(json).expect("deserialize plan");
    assert_eq!(back, sample_plan());
}

#[test]
fn schema_describes_plan_fields() {
    let schema = plan_schema().expect("schema serializes");
    assert!(schema.is_object());
    let text = schema.to_string();
    for field in ["steps", "renames", "warnings", "stats", "cycle_broken"] {
        assert!(text.contains(field), "schema should mention {field}: {text}");
    }
}
