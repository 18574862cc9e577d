#[cfg(test)]
mod reconcile_tests {
    use std::collections::HashSet;
    use std::fs;
    use std::net::Ipv4Addr;
    use std::path::Path;
    use tempfile::TempDir;

    use rtf::manifest::{parse_declared_platforms, VagrantfileNotifier};
    use rtf::platform::{PlatformError, PlatformLoader};
    use rtf::state::{GlobalState, StateFile, StateStore};
    use rtf::utils::validate_state;

    /// Workspace laid out like a real checkout: platforms/, .rtfstate, Vagrantfile
    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir(dir.path().join("platforms")).unwrap();
            Workspace { dir }
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn define(&self, platform: &str, json: &str) {
            let path = self.path().join("platforms").join(format!("{}.json", platform));
            fs::write(path, json).unwrap();
        }

        fn store(&self) -> StateStore<PlatformLoader, VagrantfileNotifier> {
            StateStore::new(
                StateFile::new(self.path().join(".rtfstate")),
                PlatformLoader::new(self.path().join("platforms")),
                VagrantfileNotifier::new(
                    self.path().join("Vagrantfile.jinja"),
                    self.path().join("Vagrantfile"),
                ),
            )
        }

        fn state_text(&self) -> String {
            fs::read_to_string(self.path().join(".rtfstate")).unwrap()
        }

        fn state(&self) -> GlobalState {
            StateFile::new(self.path().join(".rtfstate")).load().unwrap()
        }

        fn manifest_platforms(&self) -> Vec<String> {
            let content = fs::read_to_string(self.path().join("Vagrantfile")).unwrap();
            parse_declared_platforms(&content)
        }
    }

    const DEMO: &str = r#"{
  "default": { "system": "debian12", "rudder-setup": "agent" },
  "server": { "rudder-setup": "server" }, // web UI on forwarded ports
  "relay": { "rudder-setup": "relay" },
  "agent1": {}
}"#;

    const LAB: &str = r#"{
  "default": { "system": "ubuntu22_04" },
  "server": { "rudder-setup": "server" },
  "win": { "system": "windows2019", "rudder-setup": "agent" }
}"#;

    #[test]
    fn test_update_is_idempotent() {
        let ws = Workspace::new();
        ws.define("demo", DEMO);
        ws.define("lab", LAB);
        let mut store = ws.store();

        let first_report = store.update(["demo", "lab"]).unwrap();
        assert!(!first_report.assignments.is_empty());
        let first = ws.state_text();

        let second_report = store.update(["demo", "lab"]).unwrap();
        assert!(second_report.assignments.is_empty());
        assert_eq!(first, ws.state_text());
    }

    #[test]
    fn test_subnet_sequencing() {
        let ws = Workspace::new();
        ws.define("demo", DEMO);
        ws.define("lab", LAB);
        let mut store = ws.store();

        store.update(["demo"]).unwrap();
        store.update(["lab"]).unwrap();

        let state = ws.state();
        assert_eq!(state.platform("demo").unwrap().subnet, Some(Ipv4Addr::new(192, 168, 0, 0)));
        assert_eq!(state.platform("lab").unwrap().subnet, Some(Ipv4Addr::new(192, 168, 1, 0)));
    }

    #[test]
    fn test_port_sequencing_is_global() {
        let ws = Workspace::new();
        ws.define("demo", DEMO);
        ws.define("lab", LAB);
        let mut store = ws.store();

        store.update(["demo"]).unwrap();
        store.update(["lab"]).unwrap();

        let state = ws.state();
        let demo_server = state.host("demo", "demo_server").unwrap();
        let lab_server = state.host("lab", "lab_server").unwrap();
        assert_eq!((demo_server.http_port, demo_server.https_port), (Some(8080), Some(8081)));
        assert_eq!((lab_server.http_port, lab_server.https_port), (Some(8082), Some(8083)));
    }

    #[test]
    fn test_role_gating() {
        let ws = Workspace::new();
        ws.define("demo", DEMO);
        let mut store = ws.store();

        store.update(["demo"]).unwrap();
        store.update(["demo"]).unwrap();
        store.reconcile().unwrap();

        let state = ws.state();
        for host in ["demo_relay", "demo_agent1"] {
            let host = state.host("demo", host).unwrap();
            assert!(host.ip.is_some());
            assert_eq!(host.http_port, None);
            assert_eq!(host.https_port, None);
        }
    }

    #[test]
    fn test_no_collisions() {
        let ws = Workspace::new();
        ws.define("demo", DEMO);
        ws.define("lab", LAB);
        let mut store = ws.store();
        store.update(["demo", "lab"]).unwrap();

        let state = ws.state();
        assert_eq!(validate_state(&state), Ok(()));

        let mut ports = HashSet::new();
        for platform in state.platforms.values() {
            let subnet = platform.subnet.unwrap();
            let mut ips = HashSet::new();
            for host in platform.hosts.values() {
                let ip = host.ip.unwrap();
                assert_eq!(ip.octets()[..3], subnet.octets()[..3]);
                assert_ne!(ip.octets()[3], 1, "gateway address must stay free");
                assert!(ips.insert(ip));
                for port in host.ports() {
                    assert!(ports.insert(port));
                }
            }
        }
        assert_eq!(ports.len(), 4);
    }

    #[test]
    fn test_stability_under_redeclaration() {
        let ws = Workspace::new();
        ws.define("demo", DEMO);
        let mut store = ws.store();
        store.update(["demo"]).unwrap();

        let before = ws.state();
        let agent_ip = before.host("demo", "demo_agent1").unwrap().ip;

        // New ram and a new host in the definition
        ws.define(
            "demo",
            r#"{
  "default": { "system": "debian12", "rudder-setup": "agent", "ram": 4096 },
  "server": { "rudder-setup": "server" },
  "relay": { "rudder-setup": "relay" },
  "agent0": {},
  "agent1": {}
}"#,
        );
        let report = store.update(["demo"]).unwrap();
        assert_eq!(report.assignments.len(), 1);

        let after = ws.state();
        let agent1 = after.host("demo", "demo_agent1").unwrap();
        assert_eq!(agent1.ip, agent_ip);
        assert_eq!(agent1.ram, Some(256));

        let agent0 = after.host("demo", "demo_agent0").unwrap();
        assert_eq!(agent0.ram, Some(4096));
        assert!(agent0.ip.is_some());
        assert_ne!(agent0.ip, agent_ip);
        for (name, host) in &before.platform("demo").unwrap().hosts {
            assert_eq!(after.host("demo", name).unwrap().ip, host.ip);
        }
    }

    #[test]
    fn test_manual_assignment_is_kept() {
        let ws = Workspace::new();
        ws.define("demo", DEMO);
        fs::write(
            ws.path().join(".rtfstate"),
            r#"{
  "demo": {
    "subnet": "192.168.7.0",
    "hosts": {
      "demo_server": { "ip": "192.168.7.50", "http-port": 9000 }
    }
  }
}
"#,
        )
        .unwrap();

        let mut store = ws.store();
        store.update(["demo"]).unwrap();

        let state = ws.state();
        let server = state.host("demo", "demo_server").unwrap();
        assert_eq!(state.platform("demo").unwrap().subnet, Some(Ipv4Addr::new(192, 168, 7, 0)));
        assert_eq!(server.ip, Some(Ipv4Addr::new(192, 168, 7, 50)));
        assert_eq!(server.http_port, Some(9000));
        assert_eq!(server.https_port, Some(8080));
        let agent = state.host("demo", "demo_agent1").unwrap();
        assert_eq!(agent.ip, Some(Ipv4Addr::new(192, 168, 7, 2)));
    }

    #[test]
    fn test_bad_platform_does_not_abort_update() {
        let ws = Workspace::new();
        ws.define("demo", DEMO);
        ws.define("broken", "{ \"default\": {");
        ws.define("nodefault", "{ \"server\": {} }");
        let mut store = ws.store();

        let report = store.update(["broken", "demo", "nodefault", "ghost"]).unwrap();
        assert_eq!(report.skipped.len(), 3);
        assert!(matches!(report.skipped[0].error, PlatformError::Syntax { .. }));
        assert!(matches!(report.skipped[1].error, PlatformError::MissingDefault { .. }));
        assert!(matches!(report.skipped[2].error, PlatformError::NotFound { .. }));

        assert_eq!(ws.state().platform_names(), vec!["demo"]);
        assert!(ws.state().platform("demo").unwrap().subnet.is_some());
    }

    #[test]
    fn test_reconcile_covers_untouched_platforms() {
        let ws = Workspace::new();
        ws.define("lab", LAB);
        fs::write(
            ws.path().join(".rtfstate"),
            r#"{ "manual": { "hosts": { "manual_web": { "rudder-setup": "server" } } } }"#,
        )
        .unwrap();

        let mut store = ws.store();
        store.update(["lab"]).unwrap();

        let state = ws.state();
        // Platforms are walked in name order: lab, then manual
        assert_eq!(state.platform("lab").unwrap().subnet, Some(Ipv4Addr::new(192, 168, 0, 0)));
        assert_eq!(state.platform("manual").unwrap().subnet, Some(Ipv4Addr::new(192, 168, 1, 0)));

        let web = state.host("manual", "manual_web").unwrap();
        assert_eq!(web.ip, Some(Ipv4Addr::new(192, 168, 1, 2)));
        assert_eq!((web.http_port, web.https_port), (Some(8082), Some(8083)));
    }

    #[test]
    fn test_remove_frees_resources() {
        let ws = Workspace::new();
        ws.define("demo", DEMO);
        ws.define("lab", LAB);
        let mut store = ws.store();

        store.update(["demo", "lab"]).unwrap();
        assert_eq!(ws.manifest_platforms(), vec!["demo", "lab"]);

        assert!(store.remove_platform("demo").unwrap());
        assert_eq!(ws.state().platform_names(), vec!["lab"]);
        assert_eq!(ws.manifest_platforms(), vec!["lab"]);

        ws.define("next", LAB);
        store.update(["next"]).unwrap();
        let state = ws.state();
        let next = state.platform("next").unwrap();
        assert_eq!(next.subnet, Some(Ipv4Addr::new(192, 168, 0, 0)));
        assert_eq!(next.hosts["next_server"].http_port, Some(8080));
    }

    #[test]
    fn test_custom_template_is_used() {
        let ws = Workspace::new();
        ws.define("demo", DEMO);
        fs::write(
            ws.path().join("Vagrantfile.jinja"),
            "{% for p in platforms %}platform(config, '{{ p }}')\n{% endfor %}",
        )
        .unwrap();

        let mut store = ws.store();
        store.update(["demo"]).unwrap();
        let content = fs::read_to_string(ws.path().join("Vagrantfile")).unwrap();
        assert_eq!(content, "platform(config, 'demo')\n");
    }
}
