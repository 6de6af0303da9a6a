// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

// Compiles the shared identity contract. The post service only calls the
// identity service, so only the client side is generated.
fn main() {
    println!("cargo:rerun-if-changed=proto/identity.proto");
    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(&["proto/identity.proto"], &["proto"])
        .expect("Failed to compile identity.proto");
}
