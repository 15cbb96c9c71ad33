//! A hand-maintained slice of the Compose Specification JSON Schema:
//! just enough attribute/section metadata to drive completion, hover,
//! and the attribute-level diagnostics this analyzer reports.
//!
//! The upstream schema is a single large JSON document; rather than
//! vendor it wholesale we keep the subset this server actually surfaces
//! to users, in the same shape [`crate::schema`]'s Bake counterpart
//! (`dls_bake::schema`) uses for its block/attribute docs.

pub struct AttributeDoc {
    pub name: &'static str,
    pub description: &'static str,
}

pub struct SectionSchema {
    pub key: &'static str,
    pub description: &'static str,
    pub attributes: &'static [AttributeDoc],
}

pub const SERVICE: SectionSchema = SectionSchema {
    key: "services",
    description: "A service definition describing one containerized application component.",
    attributes: &[
        AttributeDoc { name: "image", description: "The image to start the container from." },
        AttributeDoc { name: "build", description: "Build configuration for the service's image." },
        AttributeDoc { name: "command", description: "Overrides the default command declared by the image." },
        AttributeDoc { name: "entrypoint", description: "Overrides the default entrypoint declared by the image." },
        AttributeDoc { name: "ports", description: "Exposed ports, as `HOST:CONTAINER` entries or long-form mappings." },
        AttributeDoc { name: "expose", description: "Ports exposed to linked services without publishing to the host." },
        AttributeDoc { name: "environment", description: "Environment variables set in the container." },
        AttributeDoc { name: "env_file", description: "Files to read environment variables from." },
        AttributeDoc { name: "volumes", description: "Mount host paths or named volumes into the container." },
        AttributeDoc { name: "networks", description: "Networks to join, referencing top-level `networks` entries." },
        AttributeDoc { name: "depends_on", description: "Startup and shutdown ordering relative to other services." },
        AttributeDoc { name: "restart", description: "Restart policy (`no`, `always`, `on-failure`, `unless-stopped`)." },
        AttributeDoc { name: "labels", description: "Metadata labels attached to the container." },
        AttributeDoc { name: "healthcheck", description: "Command used to check whether the container is healthy." },
        AttributeDoc { name: "deploy", description: "Swarm/orchestrator deployment configuration." },
        AttributeDoc { name: "profiles", description: "Named profiles this service activates under." },
        AttributeDoc { name: "configs", description: "Configs granted to the container, referencing top-level `configs`." },
        AttributeDoc { name: "secrets", description: "Secrets granted to the container, referencing top-level `secrets`." },
        AttributeDoc { name: "models", description: "AI models granted to the container, referencing top-level `models`." },
        AttributeDoc { name: "extends", description: "Base service to inherit configuration from." },
        AttributeDoc { name: "user", description: "The username or UID to run the container process as." },
        AttributeDoc { name: "working_dir", description: "Working directory for the container process." },
    ],
};

pub const NETWORK: SectionSchema = SectionSchema {
    key: "networks",
    description: "A named network that services can join.",
    attributes: &[
        AttributeDoc { name: "driver", description: "The network driver to use." },
        AttributeDoc { name: "external", description: "Marks this network as managed outside this Compose file." },
        AttributeDoc { name: "name", description: "The actual name to assign to the network." },
    ],
};

pub const VOLUME: SectionSchema = SectionSchema {
    key: "volumes",
    description: "A named volume that services can mount.",
    attributes: &[
        AttributeDoc { name: "driver", description: "The volume driver to use." },
        AttributeDoc { name: "external", description: "Marks this volume as managed outside this Compose file." },
        AttributeDoc { name: "name", description: "The actual name to assign to the volume." },
    ],
};

pub const CONFIG: SectionSchema = SectionSchema {
    key: "configs",
    description: "A configuration value made available to services.",
    attributes: &[
        AttributeDoc { name: "file", description: "Path to the file the config is populated from." },
        AttributeDoc { name: "external", description: "Marks this config as managed outside this Compose file." },
        AttributeDoc { name: "environment", description: "Environment variable the config is populated from." },
    ],
};

pub const SECRET: SectionSchema = SectionSchema {
    key: "secrets",
    description: "A sensitive value made available to services.",
    attributes: &[
        AttributeDoc { name: "file", description: "Path to the file the secret is populated from." },
        AttributeDoc { name: "external", description: "Marks this secret as managed outside this Compose file." },
        AttributeDoc { name: "environment", description: "Environment variable the secret is populated from." },
    ],
};

pub const MODEL: SectionSchema = SectionSchema {
    key: "models",
    description: "An AI model made available to services.",
    attributes: &[
        AttributeDoc { name: "model", description: "The model reference to pull, e.g. from an OCI registry." },
        AttributeDoc { name: "context_size", description: "The context window size to run the model with." },
        AttributeDoc { name: "runtime_flags", description: "Extra flags passed to the model runtime." },
    ],
};

pub const TOP_LEVEL_SECTIONS: &[&str] =
    &["services", "networks", "volumes", "configs", "secrets", "models", "include", "name", "version", "x-"];

pub fn section_schema(key: &str) -> Option<&'static SectionSchema> {
    match key {
        "services" => Some(&SERVICE),
        "networks" => Some(&NETWORK),
        "volumes" => Some(&VOLUME),
        "configs" => Some(&CONFIG),
        "secrets" => Some(&SECRET),
        "models" => Some(&MODEL),
        _ => None,
    }
}

pub fn attribute_doc(section_key: &str, attribute_name: &str) -> Option<&'static AttributeDoc> {
    section_schema(section_key)?.attributes.iter().find(|a| a.name == attribute_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_known_service_attribute() {
        let doc = attribute_doc("services", "depends_on").unwrap();
        assert!(doc.description.contains("ordering"));
    }

    #[test]
    fn returns_none_for_unknown_section() {
        assert!(section_schema("bogus").is_none());
    }
}
