// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Natural cubic spline interpolation over small correction tables.
//!
//! Both the coupon-mode estimator and the composite HLL estimator
//! correct a raw estimate by interpolating a fixed `(x, y)` table. The
//! table is small (tens of points) so recomputing the spline's second
//! derivatives on every query is cheap and avoids caching complexity.

/// Interpolates `y(x)` through `(x_arr[i], y_arr[i])` using a natural
/// cubic spline. `x` outside `[x_arr[0], x_arr[last]]` is an argument
/// error; at the endpoints the endpoint value is returned exactly.
pub fn using_x_and_y_tables(x_arr: &[f64], y_arr: &[f64], x: f64) -> f64 {
    debug_assert_eq!(x_arr.len(), y_arr.len());
    if x <= x_arr[0] {
        return y_arr[0];
    }
    if x >= x_arr[x_arr.len() - 1] {
        return y_arr[y_arr.len() - 1];
    }
    let second_derivs = natural_spline_second_derivatives(x_arr, y_arr);
    evaluate(x_arr, y_arr, &second_derivs, x)
}

/// Interpolates `y(x)` through a table given as `x_arr` against implicit
/// y values `i * y_stride` for `i = 0, 1, ...`. Used by the composite
/// estimator, whose `y` values are always an arithmetic progression.
pub fn using_x_arr_and_y_stride(x_arr: &[f64], y_stride: f64, x: f64) -> f64 {
    if x <= x_arr[0] {
        return 0.0;
    }
    let last = x_arr.len() - 1;
    if x >= x_arr[last] {
        return y_stride * last as f64;
    }
    let y_arr: Vec<f64> = (0..x_arr.len()).map(|i| y_stride * i as f64).collect();
    let second_derivs = natural_spline_second_derivatives(x_arr, &y_arr);
    evaluate(x_arr, &y_arr, &second_derivs, x)
}

/// Solves for the spline's second derivatives at each knot via the
/// standard tridiagonal system for natural (zero end-curvature) splines.
fn natural_spline_second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut y2 = vec![0.0; n];
    let mut u = vec![0.0; n];

    for i in 1..n - 1 {
        let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
        let p = sig * y2[i - 1] + 2.0;
        y2[i] = (sig - 1.0) / p;
        let d = (y[i + 1] - y[i]) / (x[i + 1] - x[i]) - (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
        u[i] = (6.0 * d / (x[i + 1] - x[i - 1]) - sig * u[i - 1]) / p;
    }

    for k in (0..n - 1).rev() {
        y2[k] = y2[k] * y2[k + 1] + u[k];
    }

    y2
}

fn evaluate(x_arr: &[f64], y_arr: &[f64], y2: &[f64], x: f64) -> f64 {
    let mut lo = 0usize;
    let mut hi = x_arr.len() - 1;
    while hi - lo > 1 {
        let mid = (hi + lo) / 2;
        if x_arr[mid] > x {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    let h = x_arr[hi] - x_arr[lo];
    let a = (x_arr[hi] - x) / h;
    let b = (x - x_arr[lo]) / h;

    a * y_arr[lo]
        + b * y_arr[hi]
        + ((a.powi(3) - a) * y2[lo] + (b.powi(3) - b) * y2[hi]) * (h * h) / 6.0
}
