use approx::assert_relative_eq;

use super::*;

fn hp(node: u32) -> Technology {
    Technology::new(node, DeviceRoadmap::Hp, TransistorType::Conventional)
        .expect("failed to initialize technology")
}

macro_rules! node_tests {
    ( $( $node:literal ),* ) => {
        paste::paste! {
            $(
                #[test]
                fn [<test_params_valid_ $node nm>]() {
                    for roadmap in [DeviceRoadmap::Hp, DeviceRoadmap::Lstp] {
                        let tech = Technology::new($node, roadmap, TransistorType::Conventional).unwrap();
                        tech.params().validate().unwrap();
                        assert_relative_eq!(tech.feature_size(), $node as f64 * 1e-9);
                    }
                }

                #[test]
                fn [<test_lstp_leaks_less_ $node nm>]() {
                    let hp = Technology::new($node, DeviceRoadmap::Hp, TransistorType::Conventional).unwrap();
                    let lstp = Technology::new($node, DeviceRoadmap::Lstp, TransistorType::Conventional).unwrap();
                    let w = 4.0 * hp.feature_size();
                    assert!(
                        lstp.gate_leakage(GateKind::Inverter, w, w, 300.0)
                            < hp.gate_leakage(GateKind::Inverter, w, w, 300.0)
                    );
                }
            )*
        }
    };
}

node_tests!(130, 90, 65, 45, 32, 28, 22, 14, 10, 7);

#[test]
fn test_supported_nodes() {
    assert_eq!(supported_nodes(), vec![7, 10, 14, 22, 28, 32, 45, 65, 90, 130]);
}

#[test]
fn test_rejects_bad_selectors() {
    let err = Technology::new(0, DeviceRoadmap::Hp, TransistorType::Conventional).unwrap_err();
    assert!(err.is_configuration());

    let err = Technology::new(40, DeviceRoadmap::Hp, TransistorType::Conventional).unwrap_err();
    assert!(err.is_configuration());

    assert!("tfet".parse::<TransistorType>().unwrap_err().is_configuration());
    assert!("lop".parse::<DeviceRoadmap>().unwrap_err().is_configuration());
    assert_eq!("LSTP".parse::<DeviceRoadmap>().unwrap(), DeviceRoadmap::Lstp);
}

#[test]
fn test_initialize_idempotent() {
    let mut tech = hp(22);
    let before = tech.clone();
    assert!(!tech
        .initialize(22, DeviceRoadmap::Hp, TransistorType::Conventional)
        .unwrap());
    assert_eq!(tech, before);

    assert!(tech
        .initialize(7, DeviceRoadmap::Hp, TransistorType::Conventional)
        .unwrap());
    assert_eq!(tech.key().process_node, 7);
    assert!(tech.is_finfet());
}

#[test]
fn test_failed_initialize_keeps_state() {
    let mut tech = hp(22);
    let before = tech.clone();
    assert!(tech
        .initialize(3, DeviceRoadmap::Hp, TransistorType::Conventional)
        .is_err());
    assert_eq!(tech, before);
}

#[test]
fn test_geometry_correction_factor() {
    let g7 = hp(7).geometry();
    let g28 = hp(28).geometry();
    assert_eq!(g28, GeometryCorrection::PLANAR);
    assert_eq!(g7.width / g28.width, 2.0);
    assert_relative_eq!(g7.height / g28.height, 28.0 / 34.0);
    assert!(hp(14).is_finfet());
    assert!(!hp(22).is_finfet());
}

/// A 7nm technology whose process parameters are otherwise identical to 28nm.
fn planar_twin_at_7nm() -> (Technology, Technology) {
    let planar = hp(28);
    let mut params = *planar.params();
    params.feature_size = 7e-9;
    let key = TechnologyKey {
        process_node: 7,
        ..planar.key()
    };
    let finfet = Technology::with_params(key, params).unwrap();
    (planar, finfet)
}

#[test]
fn test_capacitance_scaling_is_exact() {
    let (planar, finfet) = planar_twin_at_7nm();
    let w = 3.0 * 7e-9;
    let h = 28.0 * 7e-9;

    assert_eq!(
        finfet.gate_capacitance(w),
        formula::gate_capacitance(finfet.params(), 2.0 * w)
    );
    assert_eq!(
        finfet.drain_capacitance(w, MosType::Nmos, h),
        formula::drain_capacitance(finfet.params(), 2.0 * w, MosType::Nmos, h * (28.0 / 34.0))
    );

    // Width term of the gate capacitance scales by exactly the width factor.
    let poly = planar.params().phy_gate_length * planar.params().cap_polywire;
    assert_relative_eq!(
        (finfet.gate_capacitance(w) - poly) / (planar.gate_capacitance(w) - poly),
        2.0,
        max_relative = 1e-12
    );
}

#[test]
fn test_14nm_is_corrected() {
    let tech = hp(14);
    let f = tech.feature_size();
    let (w, h) = (3.0 * f, 28.0 * f);

    assert_eq!(tech.geometry(), GeometryCorrection::FINFET);
    assert_relative_eq!(tech.max_transistor_height(), 34.0 * f);
    assert_eq!(
        tech.gate_capacitance(w),
        formula::gate_capacitance(tech.params(), 2.0 * w)
    );
    assert_eq!(
        tech.drain_capacitance(w, MosType::Pmos, h),
        formula::drain_capacitance(tech.params(), 2.0 * w, MosType::Pmos, h * (28.0 / 34.0))
    );
    assert_eq!(
        tech.on_resistance(w, MosType::Nmos, 300.0),
        formula::on_resistance(tech.params(), 2.0 * w, MosType::Nmos, 300.0)
    );
}

#[test]
fn test_drain_capacitance_folding() {
    let tech = hp(45);
    let f = tech.feature_size();
    let h = tech.max_transistor_height();
    let narrow = tech.drain_capacitance(2.0 * f, MosType::Nmos, h);
    let wide = tech.drain_capacitance(40.0 * f, MosType::Nmos, h);
    assert!(narrow > 0.0);
    assert!(wide > narrow);
    assert!(tech.drain_capacitance(4.0 * f, MosType::Pmos, h) > 0.0);
}

#[test]
fn test_on_resistance_inverse_width() {
    let tech = hp(22);
    let f = tech.feature_size();
    let r1 = tech.on_resistance(f, MosType::Nmos, 300.0);
    let r2 = tech.on_resistance(2.0 * f, MosType::Nmos, 300.0);
    assert_relative_eq!(r1 / r2, 2.0, max_relative = 1e-12);
    assert!(tech.on_resistance(f, MosType::Pmos, 300.0) > r1);
    assert!(tech.on_resistance(f, MosType::Nmos, 350.0) > r1);
}

#[test]
fn test_leakage_grows_with_temperature() {
    let tech = hp(22);
    let w = tech.feature_size();
    let cold = tech.gate_leakage(GateKind::TransmissionGate, w, w, 300.0);
    let hot = tech.gate_leakage(GateKind::TransmissionGate, w, w, 320.0);
    assert_relative_eq!(hot / cold, 2.0, max_relative = 1e-12);
    assert_relative_eq!(
        tech.gate_leakage(GateKind::Inverter, w, w, 300.0),
        cold / 2.0,
        max_relative = 1e-12
    );
}

#[test]
fn test_gate_area() {
    let tech = hp(65);
    let f = tech.feature_size();
    let h = tech.max_transistor_height();

    let small = tech.gate_area(1.5 * f, 3.0 * f, h).unwrap();
    assert!(small.height <= h + 2.0 * formula::MIN_WIDTH_POWER_RAIL * f);
    assert!(small.area() > 0.0);

    let folded = tech.gate_area(30.0 * f, 60.0 * f, h).unwrap();
    assert!(folded.width > small.width);

    let err = tech.gate_area(f, f, 2.0 * f).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_rejects_bad_custom_params() {
    let tech = hp(22);
    let mut params = *tech.params();
    params.vth = params.vdd;
    assert!(Technology::with_params(tech.key(), params).is_err());

    let mut params = *tech.params();
    params.cap_junction = -1.0;
    assert!(Technology::with_params(tech.key(), params).is_err());
}
