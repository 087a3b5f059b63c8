//! Tests for the ground controller tick, deadlock resolution, and the
//! airport-level hand-off flow.

use atc_core::{AircraftId, FlightKind, GeoPoint, Instruction, NodeId};
use atc_network::{GroundNetwork, GroundNetworkBuilder};

use crate::deadlock::{DeadlockPolicy, WaitForGraph};
use crate::Airport;

/// Straight taxiway of `len` nodes, 0.0005° latitude (~56 m) apart,
/// capacity 1, no runway nodes.
fn line_network(len: u32) -> GroundNetwork {
    let mut b = GroundNetworkBuilder::new();
    let nodes: Vec<NodeId> = (0..len)
        .map(|i| b.add_node(GeoPoint::new(52.3000 + 0.0005 * i as f32, 4.7600), 1, false))
        .collect();
    for pair in nodes.windows(2) {
        b.add_taxiway(pair[0], pair[1], 55.0, 3);
    }
    b.build()
}

fn line_airport(len: u32) -> Airport {
    Airport::new("EHAM", line_network(len), 121_900, 118_100, 1_000, 7)
}

/// Register an aircraft at `nodes[leg]` with a 5 m radius.
fn announce(ap: &mut Airport, id: u32, nodes: Vec<NodeId>, leg: usize, kind: FlightKind) {
    let pos = ap.ground().network().position(nodes[leg]);
    ap.ground_mut()
        .announce_position(AircraftId(id), nodes, leg, pos, 0.0, 0.0, 0.0, 5.0, kind);
}

/// Position report placing `id` exactly on `node`.
fn report_at(ap: &mut Airport, id: u32, node: NodeId) {
    let pos = ap.ground().network().position(node);
    ap.update_aircraft_information(AircraftId(id), pos, 0.0, 5.0, 0.0, 1.0);
}

// ── Wait-for graph ────────────────────────────────────────────────────────────

mod wait_for_graph {
    use super::*;

    #[test]
    fn two_cycle_flags_both_members() {
        let g = WaitForGraph::from_edges(&[
            (AircraftId(1), AircraftId(2)),
            (AircraftId(2), AircraftId(1)),
        ]);
        assert!(g.on_cycle(AircraftId(1)));
        assert!(g.on_cycle(AircraftId(2)));

        let cycles = g.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 2);
    }

    #[test]
    fn tail_chain_is_not_on_the_cycle() {
        // 3 waits on 1, which is in a 1 ⇄ 2 ring.
        let g = WaitForGraph::from_edges(&[
            (AircraftId(3), AircraftId(1)),
            (AircraftId(1), AircraftId(2)),
            (AircraftId(2), AircraftId(1)),
        ]);
        assert!(!g.on_cycle(AircraftId(3)));
        assert!(g.on_cycle(AircraftId(1)));

        let cycles = g.cycles();
        assert_eq!(cycles.len(), 1);
        assert!(!cycles[0].contains(&AircraftId(3)));
    }

    #[test]
    fn straight_chain_has_no_cycle() {
        let g = WaitForGraph::from_edges(&[
            (AircraftId(1), AircraftId(2)),
            (AircraftId(2), AircraftId(3)),
        ]);
        assert!(!g.on_cycle(AircraftId(1)));
        assert!(g.cycles().is_empty());
    }

    #[test]
    fn three_cycle_reported_once() {
        let g = WaitForGraph::from_edges(&[
            (AircraftId(1), AircraftId(2)),
            (AircraftId(2), AircraftId(3)),
            (AircraftId(3), AircraftId(1)),
        ]);
        let cycles = g.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 3);
        for id in [1, 2, 3] {
            assert!(g.on_cycle(AircraftId(id)));
        }
    }
}

// ── Deadlock policy ───────────────────────────────────────────────────────────

mod policy {
    use super::*;

    #[test]
    fn forces_lowest_rank_then_lowest_id() {
        let p = DeadlockPolicy::default();
        let members = [(3, AircraftId(1)), (1, AircraftId(9)), (1, AircraftId(4))];
        assert_eq!(p.choose_forced(&members, None), AircraftId(4));
    }

    #[test]
    fn repeat_force_avoided_when_alternative_exists() {
        let p = DeadlockPolicy::default();
        let members = [(0, AircraftId(1)), (1, AircraftId(2))];
        assert_eq!(p.choose_forced(&members, Some(AircraftId(1))), AircraftId(2));
        // With one member there is no alternative.
        assert_eq!(
            p.choose_forced(&[(0, AircraftId(1))], Some(AircraftId(1))),
            AircraftId(1)
        );
    }

    #[test]
    fn repeat_force_allowed_when_policy_disabled() {
        let p = DeadlockPolicy { avoid_repeat_force: false };
        let members = [(0, AircraftId(1)), (1, AircraftId(2))];
        assert_eq!(p.choose_forced(&members, Some(AircraftId(1))), AircraftId(1));
    }
}

// ── Ground controller ─────────────────────────────────────────────────────────

mod controller {
    use super::*;

    #[test]
    fn malformed_routes_are_dropped() {
        let mut ap = line_airport(4);
        // No edge between nodes 0 and 2.
        announce(&mut ap, 1, vec![NodeId(0), NodeId(2)], 0, FlightKind::Departure);
        assert!(ap.ground().record(AircraftId(1)).is_none());

        // Radius 50 m exceeds every width class on a class-3 taxiway.
        let pos = ap.ground().network().position(NodeId(0));
        ap.ground_mut().announce_position(
            AircraftId(2),
            vec![NodeId(0), NodeId(1)],
            0,
            pos,
            0.0,
            0.0,
            0.0,
            50.0,
            FlightKind::Departure,
        );
        assert_eq!(ap.ground().active_count(), 0);
    }

    #[test]
    fn leg_only_ever_advances_and_route_retires() {
        let mut ap = line_airport(5);
        announce(
            &mut ap,
            1,
            vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3), NodeId(4)],
            0,
            FlightKind::Departure,
        );

        let mut last_leg = 0;
        for node in 1..5u32 {
            report_at(&mut ap, 1, NodeId(node));
            ap.update(1.0);
            if let Some(rec) = ap.ground().record(AircraftId(1)) {
                assert!(rec.route.leg() >= last_leg);
                last_leg = rec.route.leg();
            }
        }
        // Reaching the final non-runway node takes the aircraft off the net.
        assert!(ap.ground().record(AircraftId(1)).is_none());
    }

    #[test]
    fn full_node_blocks_entry_until_vacated() {
        let mut ap = line_airport(3);
        announce(&mut ap, 1, vec![NodeId(1), NodeId(2)], 0, FlightKind::Departure);
        announce(&mut ap, 2, vec![NodeId(0), NodeId(1), NodeId(2)], 0, FlightKind::Departure);

        ap.update(1.0);
        assert_eq!(ap.instruction_for(AircraftId(1)), Some(Instruction::Proceed));
        assert_eq!(ap.instruction_for(AircraftId(2)), Some(Instruction::Hold));

        // Aircraft 1 rolls to node 2, finishing its route.
        report_at(&mut ap, 1, NodeId(2));
        ap.update(1.0);
        assert!(ap.ground().record(AircraftId(1)).is_none());
        assert_eq!(ap.instruction_for(AircraftId(2)), Some(Instruction::Proceed));
    }

    #[test]
    fn contested_node_goes_to_best_rank() {
        // Three spokes converging on one center node.
        let mut b = GroundNetworkBuilder::new();
        let s1 = b.add_node(GeoPoint::new(52.3005, 4.7600), 1, false);
        let s2 = b.add_node(GeoPoint::new(52.2995, 4.7600), 1, false);
        let s3 = b.add_node(GeoPoint::new(52.3000, 4.7608), 1, false);
        let c = b.add_node(GeoPoint::new(52.3000, 4.7600), 1, false);
        for s in [s1, s2, s3] {
            b.add_taxiway(s, c, 55.0, 3);
        }
        let mut ap = Airport::new("EHAM", b.build(), 121_900, 118_100, 1_000, 7);

        // Announce order assigns ranks 0, 1, 2.
        announce(&mut ap, 1, vec![s1, c], 0, FlightKind::Departure);
        announce(&mut ap, 2, vec![s2, c], 0, FlightKind::Departure);
        announce(&mut ap, 3, vec![s3, c], 0, FlightKind::Departure);

        ap.update(1.0);
        assert_eq!(ap.instruction_for(AircraftId(1)), Some(Instruction::Proceed));
        assert_eq!(ap.instruction_for(AircraftId(2)), Some(Instruction::Hold));
        assert_eq!(ap.instruction_for(AircraftId(3)), Some(Instruction::Hold));
        // Losing a reservation is a plain wait, not a circular one.
        assert!(!ap.ground().check_for_circular_waits(AircraftId(2)));
    }

    #[test]
    fn head_on_deadlock_forces_the_lower_rank() {
        let mut ap = line_airport(2);
        // Id 2 announced first, so it carries the better (lower) rank.
        announce(&mut ap, 2, vec![NodeId(1), NodeId(0)], 0, FlightKind::Departure);
        announce(&mut ap, 1, vec![NodeId(0), NodeId(1)], 0, FlightKind::Departure);

        // Build the mutual holds without ticking, to observe the cycle.
        ap.ground_mut().check_hold_position(AircraftId(1));
        ap.ground_mut().check_hold_position(AircraftId(2));
        assert!(ap.ground().check_for_circular_waits(AircraftId(1)));
        assert!(ap.ground().check_for_circular_waits(AircraftId(2)));

        ap.update(1.0);
        assert_eq!(ap.instruction_for(AircraftId(2)), Some(Instruction::Proceed));
        assert_eq!(ap.instruction_for(AircraftId(1)), Some(Instruction::Hold));
    }

    #[test]
    fn persistent_deadlock_rotates_the_forced_aircraft() {
        let mut ap = line_airport(2);
        announce(&mut ap, 1, vec![NodeId(0), NodeId(1)], 0, FlightKind::Departure);
        announce(&mut ap, 2, vec![NodeId(1), NodeId(0)], 0, FlightKind::Departure);

        ap.update(1.0);
        assert_eq!(ap.instruction_for(AircraftId(1)), Some(Instruction::Proceed));

        // Nobody moved; the next tick re-detects the cycle but must not
        // hammer the same aircraft.
        ap.update(1.0);
        assert_eq!(ap.instruction_for(AircraftId(2)), Some(Instruction::Proceed));
        assert_eq!(ap.instruction_for(AircraftId(1)), Some(Instruction::Hold));
    }

    #[test]
    fn zero_dt_update_is_idempotent() {
        let mut ap = line_airport(2);
        announce(&mut ap, 1, vec![NodeId(0), NodeId(1)], 0, FlightKind::Departure);
        announce(&mut ap, 2, vec![NodeId(1), NodeId(0)], 0, FlightKind::Departure);

        ap.update(0.0);
        let first = ap.instruction_for(AircraftId(1));
        assert_eq!(first, Some(Instruction::Proceed));

        // Same instant again: no re-resolution, no rotation.
        ap.update(0.0);
        assert_eq!(ap.instruction_for(AircraftId(1)), first);
        assert_eq!(ap.instruction_for(AircraftId(2)), Some(Instruction::Hold));
    }

    #[test]
    fn startup_admission_is_time_gated_with_departures_first() {
        let mut ap = line_airport(4);
        let kinds = [
            FlightKind::Arrival,
            FlightKind::Departure,
            FlightKind::Arrival,
            FlightKind::Departure,
        ];
        for (i, kind) in kinds.into_iter().enumerate() {
            ap.ground_mut().schedule_startup(
                AircraftId(i as u32 + 1),
                vec![NodeId(i as u32)],
                kind,
                5.0,
                1_030,
                0,
            );
        }
        assert_eq!(ap.ground().startup_count(), 4);
        for id in 1..=4 {
            assert_eq!(ap.instruction_for(AircraftId(id)), Some(Instruction::Hold));
        }

        // Clock starts at 1 000; ten seconds in, nobody is due yet.
        ap.update(10.0);
        assert_eq!(ap.ground().active_count(), 0);

        // Past 1 030 the whole batch is admitted, departures outranking
        // arrivals and scheduling order preserved within each kind.
        ap.update(25.0);
        assert_eq!(ap.ground().active_count(), 4);
        assert_eq!(ap.ground().startup_count(), 0);
        let rank = |id: u32| ap.ground().record(AircraftId(id)).unwrap().priority;
        assert_eq!(rank(2), 0);
        assert_eq!(rank(4), 1);
        assert_eq!(rank(1), 2);
        assert_eq!(rank(3), 3);
    }

    #[test]
    fn announce_supersedes_a_scheduled_startup() {
        let mut ap = line_airport(3);
        ap.ground_mut().schedule_startup(
            AircraftId(1),
            vec![NodeId(0), NodeId(1), NodeId(2)],
            FlightKind::Departure,
            5.0,
            1_030,
            0,
        );
        // The aircraft starts taxiing on its own before the scheduled time.
        announce(&mut ap, 1, vec![NodeId(0), NodeId(1), NodeId(2)], 0, FlightKind::Departure);
        assert_eq!(ap.ground().startup_count(), 0);
        assert_eq!(ap.ground().active_count(), 1);

        // Position reports reach the active record and advance the leg.
        report_at(&mut ap, 1, NodeId(1));
        ap.update(1.0);
        assert_eq!(ap.ground().record(AircraftId(1)).unwrap().route.leg(), 1);

        // The cancelled startup never re-admits a stale leg-0 record, even
        // once its scheduled time elapses.
        ap.update(100.0);
        let rec = ap.ground().record(AircraftId(1)).unwrap();
        assert_eq!(rec.route.leg(), 1);
        assert_eq!(ap.ground().startup_count(), 0);
        assert_eq!(ap.ground().active_count(), 1);
    }

    #[test]
    fn sign_off_reaches_both_pools() {
        let mut ap = line_airport(3);
        ap.ground_mut().schedule_startup(
            AircraftId(1),
            vec![NodeId(0)],
            FlightKind::Departure,
            5.0,
            2_000,
            0,
        );
        announce(&mut ap, 2, vec![NodeId(1), NodeId(2)], 0, FlightKind::Departure);

        ap.sign_off(AircraftId(1));
        ap.sign_off(AircraftId(2));
        assert_eq!(ap.ground().startup_count(), 0);
        assert_eq!(ap.ground().active_count(), 0);

        // The cancelled startup never re-appears.
        ap.update(2_000.0);
        assert_eq!(ap.ground().active_count(), 0);
    }

    #[test]
    fn airport_without_network_refuses_everything_quietly() {
        let mut ap = Airport::without_network("ZZZZ", 121_900, 118_100);
        assert!(!ap.ground().exists());

        ap.ground_mut().announce_position(
            AircraftId(1),
            vec![NodeId(0)],
            0,
            GeoPoint::new(52.3000, 4.7600),
            0.0,
            0.0,
            0.0,
            5.0,
            FlightKind::Departure,
        );
        assert!(ap.ground().record(AircraftId(1)).is_none());
        assert_eq!(ap.instruction_for(AircraftId(1)), None);
        ap.update(1.0);
    }

    #[test]
    fn frequency_and_version_lookups() {
        let mut ap = line_airport(2);
        assert_eq!(ap.ground().get_frequency(), 121_900);
        assert_eq!(ap.tower().get_frequency(), 118_100);
        ap.ground_mut().set_version(2);
        assert_eq!(ap.ground().get_version(), 2);
    }
}

// ── Speed control ─────────────────────────────────────────────────────────────

mod speed {
    use super::*;

    /// Node 1 with capacity 2 so following traffic is slowed rather than
    /// held outright.
    fn following_airport() -> Airport {
        let mut b = GroundNetworkBuilder::new();
        let n0 = b.add_node(GeoPoint::new(52.3000, 4.7600), 1, false);
        let n1 = b.add_node(GeoPoint::new(52.3005, 4.7600), 2, false);
        let n2 = b.add_node(GeoPoint::new(52.3010, 4.7600), 1, false);
        b.add_taxiway(n0, n1, 55.0, 3);
        b.add_taxiway(n1, n2, 55.0, 3);
        Airport::new("EHAM", b.build(), 121_900, 118_100, 1_000, 7)
    }

    /// Place aircraft 1 `d` metres short of node 1 along the taxiway.
    fn place_follower(ap: &mut Airport, d: f64) {
        let n1_lat = ap.ground().network().position(NodeId(1)).lat as f64;
        let pos = GeoPoint::new((n1_lat - d / 111_320.0) as f32, 4.7600);
        ap.update_aircraft_information(AircraftId(1), pos, 0.0, 5.0, 0.0, 1.0);
    }

    fn cap_of(ap: &Airport) -> f32 {
        match ap.instruction_for(AircraftId(1)) {
            Some(Instruction::SpeedLimit(v)) => v,
            other => panic!("expected a speed limit, got {other:?}"),
        }
    }

    #[test]
    fn close_follower_gets_a_partial_cap() {
        let mut ap = following_airport();
        announce(&mut ap, 1, vec![NodeId(0), NodeId(1), NodeId(2)], 0, FlightKind::Departure);
        announce(&mut ap, 2, vec![NodeId(1), NodeId(2)], 0, FlightKind::Departure);

        // ~56 m behind the leader: inside the engage distance.
        ap.update(1.0);
        let cap = cap_of(&ap);
        assert!(cap > 0.0 && cap < 12.0, "cap {cap} out of range");
        // The leader itself stays unrestricted.
        assert_eq!(ap.instruction_for(AircraftId(2)), Some(Instruction::Proceed));
    }

    #[test]
    fn limit_holds_through_the_hysteresis_band() {
        let mut ap = following_airport();
        announce(&mut ap, 1, vec![NodeId(0), NodeId(1), NodeId(2)], 0, FlightKind::Departure);
        announce(&mut ap, 2, vec![NodeId(1), NodeId(2)], 0, FlightKind::Departure);
        ap.update(1.0);
        assert!(matches!(ap.instruction_for(AircraftId(1)), Some(Instruction::SpeedLimit(_))));

        // Drop back to a gap between the engage and release distances: the
        // limit must not flap off.
        place_follower(&mut ap, 75.0);
        ap.update(1.0);
        assert!(matches!(ap.instruction_for(AircraftId(1)), Some(Instruction::SpeedLimit(_))));

        // Past the release distance the limit clears.
        place_follower(&mut ap, 90.0);
        ap.update(1.0);
        assert_eq!(ap.instruction_for(AircraftId(1)), Some(Instruction::Proceed));
    }

    #[test]
    fn cap_grows_with_the_gap() {
        let mut ap = following_airport();
        announce(&mut ap, 1, vec![NodeId(0), NodeId(1), NodeId(2)], 0, FlightKind::Departure);
        announce(&mut ap, 2, vec![NodeId(1), NodeId(2)], 0, FlightKind::Departure);

        let mut caps = Vec::new();
        for d in [42.0, 50.0, 56.0] {
            place_follower(&mut ap, d);
            ap.ground_mut().check_speed_adjustment(AircraftId(1));
            caps.push(cap_of(&ap));
        }
        assert!(caps[0] < caps[1] && caps[1] < caps[2], "caps {caps:?} not monotone");
    }
}

// ── Airport hand-off flow ─────────────────────────────────────────────────────

mod airport_flow {
    use super::*;

    /// Taxi 0–1 feeding runway 2→3 with exit 4, plus a second hold point 5
    /// feeding the same runway.
    fn crossing_airport() -> Airport {
        let mut b = GroundNetworkBuilder::new();
        let n0 = b.add_node(GeoPoint::new(52.3000, 4.7600), 1, false);
        let n1 = b.add_node(GeoPoint::new(52.3005, 4.7600), 1, false);
        let n2 = b.add_node(GeoPoint::new(52.3010, 4.7600), 1, true);
        let n3 = b.add_node(GeoPoint::new(52.3015, 4.7600), 1, true);
        let n4 = b.add_node(GeoPoint::new(52.3020, 4.7600), 1, false);
        let n5 = b.add_node(GeoPoint::new(52.3010, 4.7608), 1, false);
        b.add_taxiway(n0, n1, 55.0, 3);
        b.add_directed_edge(n1, n2, 55.0, 3);
        b.add_directed_edge(n2, n3, 55.0, 3);
        b.add_directed_edge(n3, n4, 55.0, 3);
        b.add_directed_edge(n5, n2, 55.0, 3);
        Airport::new("EHAM", b.build(), 121_900, 118_100, 1_000, 7)
    }

    #[test]
    fn runway_is_granted_to_one_aircraft_at_a_time() {
        let mut ap = crossing_airport();
        announce(
            &mut ap,
            1,
            vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3), NodeId(4)],
            1,
            FlightKind::Departure,
        );
        announce(
            &mut ap,
            2,
            vec![NodeId(5), NodeId(2), NodeId(3), NodeId(4)],
            0,
            FlightKind::Departure,
        );

        // Both hold short; the lower id is offered first and gets the span.
        ap.update(1.0);
        assert!(ap.tower().contains(AircraftId(1)));
        assert!(ap.tower().is_claimed(NodeId(2)));
        assert_eq!(ap.instruction_for(AircraftId(1)), Some(Instruction::Proceed));
        assert_eq!(ap.instruction_for(AircraftId(2)), Some(Instruction::Hold));
        assert_eq!(ap.ground().active_count(), 1);

        // Roll aircraft 1 across the runway to the exit. Reports route to
        // the tower while it owns the aircraft.
        for node in [2u32, 3, 4] {
            report_at(&mut ap, 1, NodeId(node));
        }
        ap.update(1.0);

        // Aircraft 1 is back under ground authority; the freed span went to
        // aircraft 2 in the same tick.
        assert!(!ap.tower().contains(AircraftId(1)));
        assert!(ap.tower().contains(AircraftId(2)));
        assert!(ap.tower().is_claimed(NodeId(2)));
        assert_eq!(ap.instruction_for(AircraftId(2)), Some(Instruction::Proceed));
    }

    #[test]
    fn refused_aircraft_keeps_holding_short() {
        let mut ap = crossing_airport();
        announce(
            &mut ap,
            1,
            vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3), NodeId(4)],
            1,
            FlightKind::Departure,
        );
        announce(
            &mut ap,
            2,
            vec![NodeId(5), NodeId(2), NodeId(3), NodeId(4)],
            0,
            FlightKind::Departure,
        );

        ap.update(1.0);
        ap.update(1.0);
        // Still refused on the retry; nothing was dropped.
        assert_eq!(ap.instruction_for(AircraftId(2)), Some(Instruction::Hold));
        assert_eq!(ap.ground().active_count(), 1);
        assert_eq!(ap.tower().len(), 1);
    }

    #[test]
    fn sign_off_while_on_the_runway_clears_the_claim() {
        let mut ap = crossing_airport();
        announce(
            &mut ap,
            1,
            vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3), NodeId(4)],
            1,
            FlightKind::Departure,
        );
        ap.update(1.0);
        assert!(ap.tower().contains(AircraftId(1)));

        ap.sign_off(AircraftId(1));
        assert!(!ap.tower().contains(AircraftId(1)));
        assert!(!ap.tower().is_claimed(NodeId(2)));
    }
}
