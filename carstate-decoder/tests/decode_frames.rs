// End-to-end: raw frames -> CanSignalSource -> StateDecoder -> VehicleState
use carstate_decoder::signals::dbc::parse_dbc_str;
use carstate_decoder::units::KPH_TO_MS;
use carstate_decoder::{
    BlindSpot, Bus, CanFrame, CanSignalSource, CarStateConfig, DbcCatalog, FollowDistance,
    GearShifter, Resolution, SignalSource, SpeedKalmanFilter, StateDecoder,
};

const DBC: &str = include_str!("data/byd_atto3_test.dbc");

const PT: u8 = 0;
const CAM: u8 = 2;

fn frame(bus: u8, address: u32, data: [u8; 8]) -> CanFrame {
    CanFrame::new(1_000_000_000, bus, address, data.to_vec())
}

fn init_logging() {
    // show the library's warn!/debug! output under `cargo test -- --nocapture`
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup(enable_bsm: bool) -> (StateDecoder, CanSignalSource) {
    init_logging();
    let database = parse_dbc_str(DBC).unwrap();
    let config = CarStateConfig::new("BYD_ATTO3").with_bsm(enable_bsm);
    let catalog = DbcCatalog::from_database(config.vehicle_variant().unwrap(), &database);

    let decoder = StateDecoder::new(config, &catalog).unwrap();
    let mut source = CanSignalSource::new(database);
    decoder.subscribe(&mut source).unwrap();
    (decoder, source)
}

fn driving_frames() -> Vec<CanFrame> {
    vec![
        // FL 36.0 km/h, BL 72.0 km/h
        frame(PT, 496, [0x68, 0x01, 0x00, 0x00, 0xD0, 0x02, 0x00, 0x00]),
        // gear D
        frame(PT, 578, [4, 0, 0, 0, 0, 0, 0, 0]),
        // gas 0.30
        frame(PT, 834, [30, 0, 0, 0, 0, 0, 0, 0]),
        // doors closed, seatbelt latched
        frame(PT, 660, [0x10, 0, 0, 0, 0, 0, 0, 0]),
        // angle -12.5 deg, EPS torque 9
        frame(PT, 287, [0x83, 0xFF, 9, 0, 0, 0, 0, 0]),
        // main torque -20
        frame(PT, 318, [0xEC, 0xFF, 0, 0, 0, 0, 0, 0]),
        // right blinker
        frame(PT, 307, [0x02, 0, 0, 0, 0, 0, 0, 0]),
        // right approach
        frame(PT, 1048, [0x02, 0, 0, 0, 0, 0, 0, 0]),
        // ACC_ON2, set speed 20 km/h, distance 2
        frame(CAM, 814, [0x02, 20, 2, 0, 0, 0, 0, 0]),
        // cruise enabled
        frame(CAM, 815, [0x02, 0, 0, 0, 0, 0, 0, 0]),
        // LSS state 1, settings 2, TSR 5, LKA bit, passthrough bytes
        frame(CAM, 790, [0x21, 5, 0x01, 0xFF, 0x5F, 0, 0, 0]),
        // EPS ok
        frame(CAM, 798, [0x01, 0, 0, 0, 0, 0, 0, 0]),
    ]
}

#[test]
fn decode_full_tick_from_frames() {
    let (mut decoder, mut source) = setup(true);
    for f in driving_frames() {
        assert!(source.feed(&f), "frame 0x{:X} not consumed", f.address);
    }
    // only the button group is still silent
    assert_eq!(source.missing_groups(), vec![(Bus::Powertrain, "PCM_BUTTONS")]);

    let mut kf = SpeedKalmanFilter::new();
    let state = decoder.update(&source, &mut kf);

    assert!((state.wheel_speeds.fl - 10.0).abs() < 1e-6);
    assert!((state.wheel_speeds.rl - 20.0).abs() < 1e-6);
    assert!((state.v_ego_raw - 15.0).abs() < 1e-6);
    assert!((state.v_ego - 15.0).abs() < 1e-6);
    assert!(!state.standstill);

    assert_eq!(state.gear_shifter, GearShifter::Drive);
    assert!(!state.door_open);
    assert!(!state.seatbelt_unlatched);
    assert!((state.gas - 0.3).abs() < 1e-9);
    assert!(state.gas_pressed);
    assert!(!state.brake_pressed);

    assert!((state.steering_angle_deg + 12.5).abs() < 1e-9);
    assert_eq!(state.steering_torque, -20.0);
    // angle went down from the initial 0.0
    assert_eq!(state.steering_torque_eps, -9.0);
    assert!(state.steering_pressed);

    assert!(state.cruise_state.available);
    assert!(state.cruise_state.enabled);
    assert!((state.cruise_state.speed_cluster - 30.0 * KPH_TO_MS).abs() < 1e-9);
    assert!((state.cruise_state.speed - 30.0 * KPH_TO_MS / 1.068).abs() < 1e-9);

    assert!(state.right_blinker);
    assert!(!state.left_blinker);
    assert_eq!(state.blind_spot, Some(BlindSpot { left: false, right: true }));

    let aux = decoder.auxiliary();
    assert_eq!(aux.lss_state, 1.0);
    assert_eq!(aux.lss_alert, 2.0);
    assert_eq!(aux.tsr, 5.0);
    assert_eq!(aux.lka_on, 1.0);
    assert_eq!(aux.high_beam_assist, 255.0);
    assert_eq!(aux.passthrough, 95.0);
    assert!(aux.eps_ok);
    assert_eq!(aux.set_distance, Resolution::Known(FollowDistance::Two));
}

#[test]
fn unknown_gear_and_open_door() {
    let (mut decoder, mut source) = setup(false);
    for f in driving_frames() {
        source.feed(&f);
    }
    source.feed(&frame(PT, 578, [9, 1, 0, 0, 0, 0, 0, 0]));
    source.feed(&frame(PT, 660, [0x18, 0, 0, 0, 0, 0, 0, 0]));

    let state = decoder.update(&source, &mut SpeedKalmanFilter::new());
    assert_eq!(state.gear_shifter, GearShifter::Unknown);
    assert!(state.brake_pressed);
    assert!(state.door_open);
    assert_eq!(state.blind_spot, None);
}

#[test]
fn camera_group_on_wrong_bus_is_ignored() {
    let (mut decoder, mut source) = setup(false);
    assert!(!source.feed(&frame(PT, 814, [0x03, 80, 0, 0, 0, 0, 0, 0])));
    assert_eq!(source.latest_value(Bus::Camera, "ACC_HUD_ADAS", "SET_SPEED"), 0.0);

    let state = decoder.update(&source, &mut SpeedKalmanFilter::new());
    assert!(!state.cruise_state.available);
    assert_eq!(state.cruise_state.speed_cluster, 0.0);
    assert!(state.standstill);
    assert_eq!(state.gear_shifter, GearShifter::Unknown);
}

#[test]
fn short_frame_logged_and_dropped() {
    let (mut decoder, mut source) = setup(false);
    source.feed(&frame(PT, 578, [4, 0, 0, 0, 0, 0, 0, 0]));
    // a truncated DRIVE_STATE frame is reported and leaves the gear untouched
    assert!(!source.feed(&CanFrame::new(2_000_000_000, PT, 578, vec![])));
    assert_eq!(source.frame_count(Bus::Powertrain, "DRIVE_STATE"), 1);

    let state = decoder.update(&source, &mut SpeedKalmanFilter::new());
    assert_eq!(state.gear_shifter, GearShifter::Drive);
}

#[test]
fn state_serializes_for_downstream() {
    let (mut decoder, mut source) = setup(true);
    for f in driving_frames() {
        source.feed(&f);
    }
    let state = decoder.update(&source, &mut SpeedKalmanFilter::new());
    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["gearShifter"], "drive");
    assert_eq!(json["cruiseState"]["available"], true);
    assert_eq!(json["blindSpot"]["right"], true);
}
