//! Generated JSBSim input files: initial conditions and the run script.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::JsbsimConfig;

const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD: &str = "http://jsbsim.sf.net/JSBSimScript.xsd";
const XSL: &str = "http://jsbsim.sf.net/JSBSimScript.xsl";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InitialConditions {
    pub name: String,
    pub ubody_fps: f64,
    pub vbody_fps: f64,
    pub wbody_fps: f64,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub phi_deg: f64,
    pub theta_deg: f64,
    pub psi_deg: f64,
    pub altitude_ft: f64,
    pub elevation_ft: f64,
    pub hwind: f64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            name: "takeoff".into(),
            ubody_fps: 0.0,
            vbody_fps: 0.0,
            wbody_fps: 0.0,
            latitude_deg: 29.593978,
            longitude_deg: -95.163839,
            phi_deg: 0.0,
            theta_deg: 0.0,
            psi_deg: 0.0,
            altitude_ft: 6.6,
            elevation_ft: 2000.0,
            hwind: 0.0,
        }
    }
}

pub struct Script<'a> {
    pub aircraft: &'a str,
    pub initialize: &'a str,
    pub port: u16,
    /// end time written into the script, seconds
    pub end_s: f64,
    pub dt_s: f64,
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

pub fn initialize_xml(ic: &InitialConditions) -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str("<?xml version='1.0' encoding='utf-8'?>\n");
    xml.push_str(&format!("<initialize name=\"{}\">\n", escape(&ic.name)));
    let fields: [(&str, f64, Option<&str>); 11] = [
        ("ubody", ic.ubody_fps, Some("FT/SEC")),
        ("vbody", ic.vbody_fps, Some("FT/SEC")),
        ("wbody", ic.wbody_fps, Some("FT/SEC")),
        ("longitude", ic.longitude_deg, Some("DEG")),
        ("latitude", ic.latitude_deg, Some("DEG")),
        ("phi", ic.phi_deg, Some("DEG")),
        ("theta", ic.theta_deg, Some("DEG")),
        ("psi", ic.psi_deg, Some("DEG")),
        ("altitude", ic.altitude_ft, Some("FT")),
        ("elevation", ic.elevation_ft, Some("FT")),
        ("hwind", ic.hwind, None),
    ];
    for (tag, value, unit) in fields {
        match unit {
            Some(unit) => xml.push_str(&format!("  <{tag} unit=\"{unit}\">{value:?}</{tag}>\n")),
            None => xml.push_str(&format!("  <{tag}>{value:?}</{tag}>\n")),
        }
    }
    xml.push_str("</initialize>\n");
    xml
}

pub fn script_xml(script: &Script<'_>) -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str("<?xml version='1.0' encoding='utf-8'?>\n");
    xml.push_str(&format!("<?xml-stylesheet type=\"text/xsl\" href=\"{XSL}\"?>\n"));
    xml.push_str(&format!(
        "<runscript xmlns:xsi=\"{XSI}\" name=\"{} test\" xsi:noNamespaceSchemaLocation=\"{XSD}\">\n",
        escape(script.aircraft)
    ));
    xml.push_str(&format!(
        "  <use aircraft=\"{}\" initialize=\"{}\"/>\n",
        escape(script.aircraft),
        escape(script.initialize)
    ));
    xml.push_str(&format!("  <input port=\"{}\"/>\n", script.port));
    xml.push_str(&format!("  <run start=\"0.0\" end=\"{:?}\" dt=\"{:?}\">\n", script.end_s, script.dt_s));
    xml.push_str("    <event name=\"Set engine running\">\n");
    xml.push_str("      <description>Start the engine</description>\n");
    xml.push_str("      <condition>simulation/sim-time-sec le 0.01</condition>\n");
    xml.push_str("      <set name=\"propulsion/engine[0]/set-running\" value=\"1\"/>\n");
    xml.push_str("    </event>\n");
    xml.push_str("  </run>\n");
    xml.push_str("</runscript>\n");
    xml
}

/// Writes the initial conditions, the run script and (optionally) the
/// aircraft definition link below `cfg.root`, and returns the script path.
///
/// Each path is pushed onto `artifacts` before it is created, so a failure
/// part-way still leaves every touched file registered for removal.
///
/// The script's end time is `steps` seconds so the engine never finishes its
/// script before the driver stops iterating it.
pub fn write_scenario(
    cfg: &JsbsimConfig,
    port: u16,
    steps: u64,
    dt_s: f64,
    artifacts: &mut Vec<PathBuf>,
) -> std::io::Result<PathBuf> {
    let aircraft_dir = cfg.root.join("aircraft").join(&cfg.aircraft);

    if let Some(definition) = &cfg.aircraft_definition {
        let link = aircraft_dir.join(format!("{}.xml", cfg.aircraft));
        artifacts.push(link.clone());
        replace_symlink(Path::new(definition), &link)?;
        debug!("jsbsim: linked {} -> {}", link.display(), definition);
    }

    let ic_path = aircraft_dir.join(format!("{}.xml", cfg.initial.name));
    artifacts.push(ic_path.clone());
    fs::write(&ic_path, initialize_xml(&cfg.initial))?;

    let script_path = cfg.root.join(format!("{}_test.xml", cfg.aircraft));
    let script = Script {
        aircraft: &cfg.aircraft,
        initialize: &cfg.initial.name,
        port,
        end_s: steps as f64,
        dt_s,
    };
    artifacts.push(script_path.clone());
    fs::write(&script_path, script_xml(&script))?;

    info!("jsbsim: scenario written to {}", script_path.display());
    Ok(script_path)
}

fn replace_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    match fs::remove_file(link) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }
    std::os::unix::fs::symlink(target, link)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_has_units() {
        let xml = initialize_xml(&InitialConditions { altitude_ft: 100.0, ..Default::default() });
        assert!(xml.starts_with("<?xml version='1.0' encoding='utf-8'?>"));
        assert!(xml.contains("<initialize name=\"takeoff\">"));
        assert!(xml.contains("<altitude unit=\"FT\">100.0</altitude>"));
        assert!(xml.contains("<latitude unit=\"DEG\">29.593978</latitude>"));
        assert!(xml.contains("<hwind>0.0</hwind>"));
    }

    #[test]
    fn script_references_port_and_timestep() {
        let xml = script_xml(&Script { aircraft: "rascal", initialize: "takeoff", port: 4321, end_s: 200.0, dt_s: 0.001 });
        assert!(xml.contains("<use aircraft=\"rascal\" initialize=\"takeoff\"/>"));
        assert!(xml.contains("<input port=\"4321\"/>"));
        assert!(xml.contains("<run start=\"0.0\" end=\"200.0\" dt=\"0.001\">"));
        assert!(xml.contains("propulsion/engine[0]/set-running"));
    }

    #[test]
    fn scenario_files_are_tracked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("aircraft/rascal")).unwrap();
        let cfg = JsbsimConfig {
            root: dir.path().to_path_buf(),
            aircraft_definition: Some("Rascal110-JSBSim.xml".into()),
            ..Default::default()
        };

        let mut artifacts = Vec::new();
        let script = write_scenario(&cfg, 5555, 200, 0.001, &mut artifacts).unwrap();
        assert_eq!(artifacts.len(), 3);
        assert_eq!(artifacts.last(), Some(&script));
        for path in &artifacts {
            assert!(path.symlink_metadata().is_ok(), "{} missing", path.display());
        }
        let link = dir.path().join("aircraft/rascal/rascal.xml");
        assert_eq!(std::fs::read_link(&link).unwrap(), Path::new("Rascal110-JSBSim.xml"));

        // rewriting replaces the stale link
        write_scenario(&cfg, 5556, 200, 0.001, &mut Vec::new()).unwrap();
        let text = std::fs::read_to_string(&script).unwrap();
        assert!(text.contains("port=\"5556\""));
    }

    #[test]
    fn failed_script_write_keeps_earlier_files_tracked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("aircraft/rascal")).unwrap();
        // a directory where the script should go makes the last write fail
        std::fs::create_dir(dir.path().join("rascal_test.xml")).unwrap();
        let cfg = JsbsimConfig {
            root: dir.path().to_path_buf(),
            aircraft_definition: Some("Rascal110-JSBSim.xml".into()),
            ..Default::default()
        };

        let mut artifacts = Vec::new();
        assert!(write_scenario(&cfg, 5555, 200, 0.001, &mut artifacts).is_err());

        let link = dir.path().join("aircraft/rascal/rascal.xml");
        let ic = dir.path().join("aircraft/rascal/takeoff.xml");
        assert!(artifacts.contains(&link));
        assert!(artifacts.contains(&ic));
        assert!(link.symlink_metadata().is_ok());
        assert!(ic.exists());
    }
}
