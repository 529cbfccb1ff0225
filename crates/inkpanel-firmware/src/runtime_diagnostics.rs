use esp_idf_svc::sys;

/// Log heap usage statistics and current task stack headroom.
pub fn log_heap(label: &str) {
    let free_heap = unsafe { sys::esp_get_free_heap_size() };
    let min_free = unsafe { sys::esp_get_minimum_free_heap_size() };
    let largest_8bit = unsafe { sys::heap_caps_get_largest_free_block(sys::MALLOC_CAP_8BIT) };
    let stack_hwm_words = unsafe { sys::uxTaskGetStackHighWaterMark(core::ptr::null_mut()) };
    let stack_hwm_bytes = (stack_hwm_words as usize) * core::mem::size_of::<sys::StackType_t>();
    log::info!(
        "[MEM] {}: free={} min_free={} largest_8bit={} stack_hwm={}B",
        label,
        free_heap,
        min_free,
        largest_8bit,
        stack_hwm_bytes
    );
}

/// Warn when the main task stack is smaller than startup needs.
pub fn check_main_stack(required: u32) {
    let configured = sys::CONFIG_ESP_MAIN_TASK_STACK_SIZE;
    if configured < required {
        log::warn!(
            "Stack size too small: {} bytes (need >= {}). Check sdkconfig.defaults",
            configured,
            required
        );
    }
    log::info!("Starting firmware with {} bytes stack", configured);
}
