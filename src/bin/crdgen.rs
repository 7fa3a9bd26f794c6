//! # CRD Generator
//!
//! Prints the `OriginIssuer` and `ClusterOriginIssuer` CustomResourceDefinitions
//! as a multi-document YAML stream.
//!
//! ```bash
//! cargo run --bin crdgen > deploy/crds/crds.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::CustomResourceExt;
use origin_ca_issuer::crd::{ClusterOriginIssuer, OriginIssuer};

fn main() -> anyhow::Result<()> {
    let documents = [
        serde_yaml::to_string(&OriginIssuer::crd())?,
        serde_yaml::to_string(&ClusterOriginIssuer::crd())?,
    ];
    print!("{}", documents.join("---\n"));
    Ok(())
}
