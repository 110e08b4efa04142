// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Camera capture backed by nokhwa's native backends (V4L2, AVFoundation,
//! MSMF).

mod source;

pub use source::{list_devices, CameraId, CameraSource};
