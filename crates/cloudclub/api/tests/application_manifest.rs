use cloudclub_api::application::{AppType, ApplicationCrd};
use kube::{CustomResourceExt, ResourceExt};

const MANIFEST: &str = r#"
apiVersion: app.cloudclub.com/v1alpha1
kind: Application
metadata:
  name: web
  namespace: shop
spec:
  app:
    image: nginx:1.27
    containerPort: 8080
    replicas: 3
    appType: front-spa
    annotations:
      prometheus.io/scrape: "true"
  scheduler:
    nodeSelector:
      disktype: ssd
  probe:
    readiness:
      httpGet:
        path: /healthz
        port: 8080
  ingress:
    enabled: true
    rules:
      host: shop.example.com
      paths:
        - path: /api
        - path: /static
          serviceName: ignored
          port: 9999
"#;

#[test]
fn parse_manifest() {
    let app: ApplicationCrd = ::serde_yaml::from_str(MANIFEST).expect("failed to parse manifest");

    assert_eq!(app.name_any(), "web");
    assert_eq!(app.namespace().as_deref(), Some("shop"));

    let spec = &app.spec;
    assert_eq!(spec.app.image, "nginx:1.27");
    assert_eq!(spec.app.container_port, 8080);
    assert_eq!(spec.app.container_name, "");
    assert_eq!(spec.app.replicas, Some(3));
    assert_eq!(spec.app.app_type, Some(AppType::FrontSpa));
    assert_eq!(
        spec.app.annotations.get("prometheus.io/scrape").map(String::as_str),
        Some("true"),
    );
    assert_eq!(
        spec.scheduler.node_selector.get("disktype").map(String::as_str),
        Some("ssd"),
    );
    assert!(spec.scheduler.affinity.is_none());
    assert!(spec.probe.readiness.is_some());
    assert!(spec.probe.liveness.is_none());
    assert!(spec.service.is_enabled());
    assert!(spec.ingress.enabled);
    assert_eq!(spec.ingress.rules.host, "shop.example.com");
    assert_eq!(spec.ingress.rules.paths.len(), 2);
    assert_eq!(spec.ingress.rules.paths[1].port, Some(9999));
}

#[test]
fn parse_minimal_manifest() {
    let app: ApplicationCrd = ::serde_yaml::from_str(
        r#"
apiVersion: app.cloudclub.com/v1alpha1
kind: Application
metadata:
  name: api
spec:
  app:
    image: ghcr.io/cloud-club/api:latest
    containerPort: 3000
"#,
    )
    .expect("failed to parse manifest");

    assert_eq!(app.spec.app.replicas, None);
    assert_eq!(app.spec.termination_grace_period_seconds, None);
    assert!(!app.spec.ingress.enabled);
    assert!(app.spec.ingress.rules.paths.is_empty());
    assert!(app.status.is_none());
}

#[test]
fn generate_crd() {
    let crd = ApplicationCrd::crd();

    assert_eq!(crd.spec.group, "app.cloudclub.com");
    assert_eq!(crd.spec.names.kind, "Application");
    assert_eq!(crd.spec.names.plural, "applications");
    assert_eq!(crd.spec.scope, "Namespaced");
    assert_eq!(crd.spec.versions.len(), 1);
    assert_eq!(crd.spec.versions[0].name, "v1alpha1");

    let schema = ::serde_json::to_value(&crd.spec.versions[0].schema).expect("schema");
    let port = &schema["openAPIV3Schema"]["properties"]["spec"]["properties"]["app"]
        ["properties"]["containerPort"];
    assert_eq!(port["minimum"], 1.0);
}
