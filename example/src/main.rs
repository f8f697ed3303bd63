use kasvu::{
    alloc::{ArenaAlloc, LogAlloc},
    log::{self, info, warn, error, Level, Color},
    mem::{Bounded, Doubling, DynArray},
    GLOBAL_ALLOC,
    VERSION,
};

fn scenario() {
    let alloc = LogAlloc::new(&GLOBAL_ALLOC, "global");
    let mut array = DynArray::<i32, _, Doubling>::new_in(&alloc);
    for i in 1..=10 {
        array.push(i);
    }
    info!("appended 1..=10: len {}, capacity {}", array.len(), array.capacity());

    let removed = array.remove(3);
    info!("removed {} in order: {:?}", removed, array);

    let removed = array.swap_remove(0);
    info!("removed {} unordered: {:?}", removed, array);

    array.sort_by(|a, b| b.cmp(a));
    info!("sorted descending: {:?}", array);

    array.terminate();
    info!("terminated: len {}, capacity {}", array.len(), array.capacity());
}

fn exhaust_arena() {
    let Some(arena) = ArenaAlloc::new(4096) else {
        error!("could not reserve arena");
        return
    };
    let alloc = LogAlloc::new(&arena, "arena");
    let mut array = DynArray::<u64, _, Doubling>::new_in(&alloc);
    let mut value = 0;
    loop {
        array.push(value);
        if array.out_of_memory() {
            warn!("arena exhausted after {} values ({} of {} bytes used)",
                array.len(), arena.used(), arena.size(),
            );
            break
        }
        value += 1;
    }
}

fn bounded_growth() {
    let mut array = DynArray::<u32, _, Bounded<1024>>::new_in(&GLOBAL_ALLOC);
    if let Err(err) = (0..u32::MAX).try_for_each(|i| array.try_push(i).map(|_| ())) {
        info!("bounded array stopped at {} values: {}", array.len(), err);
    }
}

fn main() {
    log::init();
    let fmt = log::info_fmt(|fmt| {
        fmt.text("kasvu ", |s| s.fg(Color::Cyan).bold())
            .target(|s| s.intense())
            .text(" | ", |s| s)
            .message(|s| s);
    });
    if let Err(err) = fmt {
        warn!("keeping previous info format: {}", err);
    }
    if log::log(module_path!(), Level::Info, format_args!("array semantics {}", VERSION)).is_err() {
        eprintln!("logger unavailable");
    }
    scenario();
    exhaust_arena();
    bounded_growth();
}
