//! Render-list capture and replay.

mod common;

use common::TestTarget;
use pixelforge::*;

fn draw_scene(ctx: &mut Context) {
    ctx.begin(DrawMode::Triangles);
    ctx.color3ub(255, 0, 0);
    ctx.vertex2f(-1.0, -1.0);
    ctx.color3ub(0, 255, 0);
    ctx.vertex2f(1.0, -1.0);
    ctx.color3ub(0, 0, 255);
    ctx.vertex2f(-1.0, 1.0);
    ctx.end();
    ctx.begin(DrawMode::Lines);
    ctx.color3ub(255, 255, 0);
    ctx.vertex2f(-1.0, 1.0);
    ctx.vertex2f(1.0, -1.0);
    ctx.end();
}

#[test]
fn replay_matches_inline_execution() {
    let inline = {
        let t = TestTarget::new(8, 8);
        draw_scene(&mut t.ctx.borrow_mut());
        t
    };

    let replayed = {
        let t = TestTarget::new(8, 8);
        {
            let mut ctx = t.ctx.borrow_mut();
            let list = ctx.gen_list();
            ctx.new_list(&list);
            draw_scene(&mut ctx);
            ctx.end_list();
            ctx.call_list(&list);
        }
        t
    };

    assert_eq!(inline.buf, replayed.buf);
}

#[test]
fn recording_does_not_rasterize() {
    let t = TestTarget::new(8, 8);
    {
        let mut ctx = t.ctx.borrow_mut();
        let list = ctx.gen_list();
        ctx.new_list(&list);
        draw_scene(&mut ctx);
        ctx.end_list();
        assert_eq!(list.borrow().len(), 2);
    }
    assert!(t.buf.iter().all(|b| *b == 0), "recording wrote pixels");
}

#[test]
fn recording_restores_latches_afterwards() {
    let t = TestTarget::new(4, 4);
    let mut ctx = t.ctx.borrow_mut();
    ctx.color3ub(11, 22, 33);
    let list = ctx.gen_list();
    ctx.new_list(&list);
    ctx.color3ub(200, 200, 200);
    ctx.normal3f(1.0, 0.0, 0.0);
    ctx.end_list();
    let mut color = [0i32; 4];
    ctx.get_integerv(GetParam::CurrentColor, &mut color);
    assert_eq!(&color[..3], &[11, 22, 33]);
}

#[test]
fn nested_recording_is_rejected() {
    let t = TestTarget::new(4, 4);
    let mut ctx = t.ctx.borrow_mut();
    let a = ctx.gen_list();
    let b = ctx.gen_list();
    ctx.new_list(&a);
    ctx.new_list(&b);
    assert_eq!(ctx.get_error(), ErrorCode::InvalidOperation);
    ctx.end_list();
}

#[test]
fn new_list_reinitializes_a_replayed_list() {
    let t = TestTarget::new(4, 4);
    let mut ctx = t.ctx.borrow_mut();
    let list = ctx.gen_list();
    ctx.new_list(&list);
    draw_scene(&mut ctx);
    ctx.end_list();
    assert_eq!(list.borrow().len(), 2);

    ctx.new_list(&list);
    ctx.end_list();
    assert_eq!(list.borrow().len(), 0);
}

#[test]
fn captured_attribute_sequences_stay_parallel() {
    let t = TestTarget::new(4, 4);
    let mut ctx = t.ctx.borrow_mut();
    let list = ctx.gen_list();
    ctx.new_list(&list);
    draw_scene(&mut ctx);
    ctx.end_list();
    let guard = list.borrow();
    for call in guard.calls() {
        let n = call.positions.len();
        assert_eq!(call.texcoords.len(), n);
        assert_eq!(call.normals.len(), n);
        assert_eq!(call.colors.len(), n);
    }
}
