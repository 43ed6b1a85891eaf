//! デバッガ上で動かすサンプル

use wee_core::{trace_call, trace_line};

/// 簡単な計算とループ
pub fn example_function(n: i64) -> i64 {
    trace_call!("example_function"; n);
    trace_line!(n; let x = 1);
    trace_line!(n, x; let y = 2);
    trace_line!(n, x, y; let mut result = x + y + n);
    for i in 0..n {
        trace_line!(n, x, y, result, i; result += i);
    }
    trace_line!(n, x, y, result; return result);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_function_untraced() {
        assert_eq!(example_function(3), 9);
        assert_eq!(example_function(0), 3);
    }
}
