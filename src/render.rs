//! Manifest rendering from deployment values.
//!
//! Two embedded templates, filled with a [`DeploymentValues`]: the workload
//! Deployment and the KEDA ScaledObject. Rendering is a pure function of the
//! values; no state is retained between renders. Undefined references are
//! errors (strict mode), so rendering the ScaledObject without a scaling
//! section fails instead of producing a half-empty manifest.

use minijinja::{Environment, UndefinedBehavior, Value};

use crate::values::DeploymentValues;
use crate::Result;

const DEPLOYMENT_TEMPLATE: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: {{ name }}
  namespace: {{ namespace }}
  labels:
    app: {{ name }}
spec:
  replicas: {{ replicas }}
  selector:
    matchLabels:
      app: {{ name }}
  template:
    metadata:
      labels:
        app: {{ name }}
    spec:
      containers:
        - name: {{ name }}
          image: {{ image }}
          ports:
            - containerPort: {{ port }}
          resources:
            requests:
              cpu: {{ cpu_request }}
              memory: {{ mem_request }}
            limits:
              cpu: {{ cpu_limit }}
              memory: {{ mem_limit }}
"#;

const SCALED_OBJECT_TEMPLATE: &str = r#"apiVersion: keda.sh/v1alpha1
kind: ScaledObject
metadata:
  name: {{ name }}-so
  namespace: {{ namespace }}
spec:
  scaleTargetRef:
    name: {{ name }}
  minReplicaCount: {{ scaling.min_replicas }}
  maxReplicaCount: {{ scaling.max_replicas }}
  triggers:
    - type: {{ scaling.trigger_type }}
      metadata:
{% for key, value in scaling.trigger_metadata|items %}
        {{ key }}: "{{ value }}"
{% endfor %}
"#;

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env
}

fn render(template: &str, values: &DeploymentValues) -> Result<String> {
    let env = environment();
    Ok(env.render_str(template, Value::from_serialize(values))?)
}

/// Render the workload Deployment manifest.
pub fn render_deployment(values: &DeploymentValues) -> Result<String> {
    render(DEPLOYMENT_TEMPLATE, values)
}

/// Render the KEDA ScaledObject manifest.
///
/// Fails if `values.scaling` is absent.
pub fn render_scaled_object(values: &DeploymentValues) -> Result<String> {
    render(SCALED_OBJECT_TEMPLATE, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::parse_values;
    use k8s_openapi::api::apps::v1::Deployment;

    fn sample_values() -> DeploymentValues {
        parse_values(
            "name: api\nimage: img:1\nscaling:\n  trigger_type: cpu\n  trigger_metadata:\n    type: Utilization\n    value: \"50\"\n  min_replicas: 2\n  max_replicas: 5\n",
        )
        .unwrap()
    }

    #[test]
    fn deployment_renders_with_defaults() {
        let rendered = render_deployment(&sample_values()).unwrap();
        let deployment: Deployment = serde_yaml::from_str(&rendered).unwrap();

        let metadata = deployment.metadata;
        assert_eq!(metadata.name.as_deref(), Some("api"));
        assert_eq!(metadata.namespace.as_deref(), Some("default"));

        let spec = deployment.spec.unwrap();
        assert_eq!(spec.replicas, Some(1));
        let container = &spec.template.spec.unwrap().containers[0];
        assert_eq!(container.image.as_deref(), Some("img:1"));
        assert_eq!(container.ports.as_ref().unwrap()[0].container_port, 80);
    }

    #[test]
    fn deployment_selector_matches_pod_labels() {
        let rendered = render_deployment(&sample_values()).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(
            doc["spec"]["selector"]["matchLabels"]["app"],
            doc["spec"]["template"]["metadata"]["labels"]["app"]
        );
        assert_eq!(doc["metadata"]["labels"]["app"], serde_yaml::Value::from("api"));
    }

    #[test]
    fn scaled_object_renders_trigger_and_bounds() {
        let rendered = render_scaled_object(&sample_values()).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();

        assert_eq!(doc["metadata"]["name"], serde_yaml::Value::from("api-so"));
        assert_eq!(doc["metadata"]["namespace"], serde_yaml::Value::from("default"));
        assert_eq!(doc["spec"]["scaleTargetRef"]["name"], serde_yaml::Value::from("api"));
        assert_eq!(doc["spec"]["minReplicaCount"], serde_yaml::Value::from(2));
        assert_eq!(doc["spec"]["maxReplicaCount"], serde_yaml::Value::from(5));

        let trigger = &doc["spec"]["triggers"][0];
        assert_eq!(trigger["type"], serde_yaml::Value::from("cpu"));
        assert_eq!(trigger["metadata"]["type"], serde_yaml::Value::from("Utilization"));
        assert_eq!(trigger["metadata"]["value"], serde_yaml::Value::from("50"));
    }

    #[test]
    fn scaled_object_with_empty_metadata_still_parses() {
        let values = parse_values(
            "name: api\nimage: img:1\nscaling:\n  trigger_type: cpu\n  trigger_metadata: {}\n",
        )
        .unwrap();
        let rendered = render_scaled_object(&values).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(doc["spec"]["minReplicaCount"], serde_yaml::Value::from(1));
        assert_eq!(doc["spec"]["maxReplicaCount"], serde_yaml::Value::from(10));
    }

    #[test]
    fn scaled_object_without_scaling_section_fails() {
        let values = parse_values("name: api\nimage: img:1\n").unwrap();
        assert!(render_scaled_object(&values).is_err());
    }
}
