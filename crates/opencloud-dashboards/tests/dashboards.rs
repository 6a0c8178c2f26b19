// Numan Thabit 2025
use std::collections::HashSet;

use grafana_kit::Thresholds;
use opencloud_dashboards::{lint, render, write_all, DashboardKind, Datasources};

#[test]
fn every_dashboard_builds_with_a_unique_uid() {
    let ds = Datasources::default();
    let uids: HashSet<String> = DashboardKind::ALL
        .iter()
        .filter_map(|kind| kind.build(&ds).unwrap().uid)
        .collect();
    assert_eq!(uids.len(), DashboardKind::ALL.len());
    assert!(uids.contains("opencloud-overview"));
    assert!(uids.contains("activitylog-debug"));
}

#[test]
fn ref_ids_restart_in_every_panel() {
    let ds = Datasources::default();
    for kind in DashboardKind::ALL {
        let dashboard = kind.build(&ds).unwrap();
        for panel in dashboard.all_panels() {
            for (index, target) in panel.targets.iter().enumerate() {
                let expected = char::from(b'A' + index as u8).to_string();
                assert_eq!(
                    target.ref_id.as_str(),
                    expected,
                    "{} panel {:?}",
                    kind.name(),
                    panel.id
                );
            }
        }
    }
}

#[test]
fn shipped_dashboards_pass_lint() {
    let ds = Datasources::default();
    for kind in DashboardKind::ALL {
        let issues = lint(&kind.build(&ds).unwrap());
        assert!(issues.is_empty(), "{}: {issues:?}", kind.name());
    }
}

#[test]
fn configured_uids_reach_every_panel() {
    let ds = Datasources::new("mimir-prod", "loki-prod");
    for kind in DashboardKind::ALL {
        let dashboard = kind.build(&ds).unwrap();
        for panel in dashboard.all_panels() {
            let Some(source) = &panel.datasource else {
                continue;
            };
            assert!(
                source.uid == "mimir-prod" || source.uid == "loki-prod",
                "{} panel {:?} points at {}",
                kind.name(),
                panel.id,
                source.uid
            );
        }
    }
}

#[test]
fn rendered_documents_are_grafana_shaped() {
    let ds = Datasources::default();
    for kind in DashboardKind::ALL {
        let json = render(&kind.build(&ds).unwrap(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["uid"], kind.uid());
        assert_eq!(value["schemaVersion"], 39);
        assert!(value["panels"].as_array().is_some_and(|p| !p.is_empty()));
        assert!(value["templating"]["list"].is_array());
    }
}

#[test]
fn uploads_ramps_go_through_checked_constructor() {
    let dashboard = DashboardKind::Uploads.build(&Datasources::default()).unwrap();
    let ramps: Vec<Thresholds> = [120, 130]
        .into_iter()
        .filter_map(|id| dashboard.all_panels().find(|p| p.id == Some(id)))
        .filter_map(|panel| panel.field_config.defaults.thresholds.clone())
        .collect();
    assert_eq!(
        ramps,
        [
            Thresholds::custom("blue", &[(20.0, "yellow"), (100.0, "red")]).unwrap(),
            Thresholds::custom("purple", &[(50.0, "yellow"), (200.0, "red")]).unwrap(),
        ]
    );
}

#[test]
fn write_all_emits_one_file_per_dashboard() {
    let tmp = tempfile::TempDir::new().unwrap();
    let written = write_all(tmp.path(), &Datasources::default(), false).unwrap();
    assert_eq!(written.len(), DashboardKind::ALL.len());
    for (kind, path) in DashboardKind::ALL.iter().zip(&written) {
        assert_eq!(path, &tmp.path().join(format!("{}.json", kind.uid())));
        let body = std::fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["uid"], kind.uid());
    }
}
