//! Version probing degrades each failed field to Unknown independently

mod common;

use common::*;
use steward_common::clients::{ConsensusClient, ExecutionClient};
use steward_common::{ClientVersionSet, ProbedVersion};

#[test]
fn execution_client_all_fields() {
    let world = World::healthy();
    world.binaries.set("geth", geth_version_output("1.10.12"));

    let versions = world.probe().probe_execution(ExecutionClient::Geth);

    assert_eq!(
        versions,
        ClientVersionSet::from_strs("1.10.12", "1.10.13", "1.10.13", "1.10.13")
    );
}

#[test]
fn consensus_client_has_no_available() {
    let world = World::healthy();

    let versions = world.probe().probe_consensus(ConsensusClient::Lighthouse);

    assert_eq!(versions.installed, ProbedVersion::parse("2.0.1"));
    assert_eq!(versions.running, ProbedVersion::parse("2.0.1"));
    assert_eq!(versions.available, ProbedVersion::Unknown);
    assert_eq!(versions.latest, ProbedVersion::parse("2.0.1"));
}

#[test]
fn each_failure_is_isolated() {
    let world = World::healthy();
    world.binaries.outputs.borrow_mut().clear();
    *world.local_api.execution_agent.borrow_mut() = None;

    let versions = world.probe().probe_execution(ExecutionClient::Geth);

    assert_eq!(versions.installed, ProbedVersion::Unknown);
    assert_eq!(versions.running, ProbedVersion::Unknown);
    assert_eq!(versions.available, ProbedVersion::parse("1.10.13"));
    assert_eq!(versions.latest, ProbedVersion::parse("1.10.13"));
}

#[test]
fn unreachable_release_feed_means_unknown_latest() {
    let mut world = World::healthy();
    world.releases = FakeReleases::default();

    let versions = world.probe().probe_consensus(ConsensusClient::Lighthouse);
    assert_eq!(versions.latest, ProbedVersion::Unknown);
    assert!(versions.installed.is_known());
}

#[test]
fn garbage_banners_are_unknown() {
    let world = World::healthy();
    world.binaries.set("geth", "geth: command crashed".to_string());
    *world.local_api.execution_agent.borrow_mut() = Some("Nethermind/v1.12.0".to_string());

    let versions = world.probe().probe_execution(ExecutionClient::Geth);
    assert_eq!(versions.installed, ProbedVersion::Unknown);
    assert_eq!(versions.running, ProbedVersion::Unknown);
}

#[test]
fn missing_candidate_is_unknown() {
    let world = World::healthy();
    world.packages.candidates.borrow_mut().clear();

    let versions = world.probe().probe_execution(ExecutionClient::Geth);
    assert_eq!(versions.available, ProbedVersion::Unknown);
}

#[test]
fn index_refresh_is_optional_and_non_fatal() {
    let mut world = World::healthy();
    world.packages.fail_refresh = true;

    let mut probe = world.probe();
    let versions = probe.probe_execution(ExecutionClient::Geth);
    assert!(world.packages.calls().is_empty());
    assert!(versions.available.is_known());

    probe.refresh_package_index = true;
    let versions = probe.probe_execution(ExecutionClient::Geth);
    assert_eq!(world.packages.calls(), vec!["refresh"]);
    assert!(versions.available.is_known());
}
