// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Generated messages and client for `identity.v1`, compiled by `build.rs`
//! from `proto/identity.proto`.

tonic::include_proto!("identity.v1");

pub use identity_verifier_client::IdentityVerifierClient;
