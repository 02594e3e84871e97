/// Probe whether the host CPU has the vector extensions the kernels can exploit.
///
/// SSSE3 on x86/x86_64, NEON on aarch64; everything else reports `false`.
pub fn cpu_supports_simd() -> bool {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        std::arch::is_x86_feature_detected!("ssse3")
    }
    #[cfg(target_arch = "aarch64")]
    {
        std::arch::is_aarch64_feature_detected!("neon")
    }
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    {
        false
    }
}
