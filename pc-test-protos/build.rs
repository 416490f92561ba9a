// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use protobuf_codegen::Customize;

fn main() {
  println!("cargo:rerun-if-changed=src/protos/");

  // Compile the test fixtures with the pure Rust parser so the build does
  // not depend on a protoc binary.
  protobuf_codegen::Codegen::new()
    .pure()
    .customize(Customize::default().oneofs_non_exhaustive(false))
    .includes(["src/protos"])
    .inputs(["src/protos/test_messages.proto"])
    .cargo_out_dir("protos")
    .run_from_script();
}
