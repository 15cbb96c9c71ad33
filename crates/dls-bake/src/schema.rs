//! Static Bake schema used for schema-driven completion/hover when the
//! focused position isn't one of the cross-referencing special cases
//! (`inherits`, `target`, `args`).
//!
//! Hand-written rather than generated from `buildx`'s own schema: Bake's
//! attribute set is small and stable enough that a static table is the
//! pragmatic choice, the same way `dls-dockerfile`'s built-in ARG list
//! is a static slice rather than a fetched document.

pub struct AttributeDoc {
    pub name: &'static str,
    pub description: &'static str,
    /// Snippet body inserted for required fields during block completion;
    /// `None` means the attribute is optional.
    pub required_snippet: Option<&'static str>,
}

pub struct BlockSchema {
    pub ident: &'static str,
    pub description: &'static str,
    pub attributes: &'static [AttributeDoc],
}

pub const TARGET: BlockSchema = BlockSchema {
    ident: "target",
    description: "A single `docker buildx build` invocation.",
    attributes: &[
        AttributeDoc { name: "context", description: "Build context path or URL.", required_snippet: None },
        AttributeDoc { name: "dockerfile", description: "Path to the Dockerfile, relative to `context`.", required_snippet: None },
        AttributeDoc { name: "dockerfile-inline", description: "Inline Dockerfile contents; mutually exclusive with `dockerfile`.", required_snippet: None },
        AttributeDoc { name: "args", description: "Build arguments passed as `ARG` values.", required_snippet: Some("{\n    $1\n  }") },
        AttributeDoc { name: "contexts", description: "Additional named build contexts.", required_snippet: None },
        AttributeDoc { name: "labels", description: "OCI image labels to set on the built image.", required_snippet: None },
        AttributeDoc { name: "tags", description: "Image tags to apply to the build result.", required_snippet: Some("[\"$1\"]") },
        AttributeDoc { name: "target", description: "The Dockerfile build stage to build.", required_snippet: None },
        AttributeDoc { name: "no-cache-filter", description: "Stage names to exclude from the build cache.", required_snippet: None },
        AttributeDoc { name: "platforms", description: "Target platforms, e.g. `linux/amd64`.", required_snippet: None },
        AttributeDoc { name: "output", description: "Build result output destinations.", required_snippet: None },
        AttributeDoc { name: "cache-from", description: "External cache sources to import from.", required_snippet: None },
        AttributeDoc { name: "cache-to", description: "External cache destinations to export to.", required_snippet: None },
        AttributeDoc { name: "secret", description: "Secrets to expose to the build.", required_snippet: None },
        AttributeDoc { name: "ssh", description: "SSH agent sockets or keys to expose to the build.", required_snippet: None },
        AttributeDoc { name: "pull", description: "Always attempt to pull a newer base image.", required_snippet: None },
        AttributeDoc { name: "no-cache", description: "Disable the build cache entirely.", required_snippet: None },
        AttributeDoc { name: "network", description: "Network mode for `RUN` instructions (`default`, `host`, `none`).", required_snippet: None },
        AttributeDoc { name: "annotations", description: "OCI annotations to attach to the build result.", required_snippet: None },
        AttributeDoc { name: "attest", description: "Build attestations to generate (`provenance`, `sbom`).", required_snippet: None },
        AttributeDoc { name: "entitlements", description: "Extra privileges to grant the build (`network.host`, `security.insecure`).", required_snippet: None },
        AttributeDoc { name: "inherits", description: "Other target labels whose attributes this target starts from.", required_snippet: None },
        AttributeDoc { name: "matrix", description: "Cartesian-product values used to derive multiple targets from this one.", required_snippet: None },
        AttributeDoc { name: "name", description: "Name template used when expanding a matrix target.", required_snippet: None },
        AttributeDoc { name: "shm-size", description: "Size of `/dev/shm` for the build container.", required_snippet: None },
        AttributeDoc { name: "ulimits", description: "Resource limits applied to the build container.", required_snippet: None },
        AttributeDoc { name: "call", description: "Frontend subrequest to invoke instead of a full build (e.g. `check`).", required_snippet: None },
    ],
};

pub const GROUP: BlockSchema = BlockSchema {
    ident: "group",
    description: "A named collection of targets/groups built together.",
    attributes: &[
        AttributeDoc { name: "targets", description: "Target and group labels included in this group.", required_snippet: Some("[\"$1\"]") },
        AttributeDoc { name: "description", description: "Human-readable description shown by `buildx bake --list`.", required_snippet: None },
    ],
};

pub const VARIABLE: BlockSchema = BlockSchema {
    ident: "variable",
    description: "A user-settable value, overridable via environment variables of the same name.",
    attributes: &[
        AttributeDoc { name: "default", description: "Value used when no environment variable overrides this variable.", required_snippet: None },
        AttributeDoc { name: "description", description: "Human-readable description shown by `buildx bake --list`.", required_snippet: None },
        AttributeDoc { name: "validation", description: "Validation rules the resolved value must satisfy.", required_snippet: None },
    ],
};

pub const FUNCTION: BlockSchema = BlockSchema {
    ident: "function",
    description: "A user-defined HCL function usable from other expressions in this file.",
    attributes: &[
        AttributeDoc { name: "params", description: "Parameter names accepted by the function.", required_snippet: None },
        AttributeDoc { name: "variadic_params", description: "Name bound to any trailing variadic arguments.", required_snippet: None },
        AttributeDoc { name: "result", description: "Expression evaluated to produce the function's return value.", required_snippet: None },
    ],
};

pub fn block_schema(ident: &str) -> Option<&'static BlockSchema> {
    match ident {
        "target" => Some(&TARGET),
        "group" => Some(&GROUP),
        "variable" => Some(&VARIABLE),
        "function" => Some(&FUNCTION),
        _ => None,
    }
}

pub fn attribute_doc(block_ident: &str, attribute_name: &str) -> Option<&'static AttributeDoc> {
    block_schema(block_ident)?.attributes.iter().find(|a| a.name == attribute_name)
}

pub const TOP_LEVEL_BLOCKS: &[&str] = &["target", "group", "variable", "function"];
